//! XMP packet parser
//!
//! Reads the RDF/XML of an XMP packet into a flat list of properties.
//! Structures are flattened to `Struct/ns:Field` paths and arrays of
//! structures to `Array[n]/ns:Field` paths.

use std::collections::BTreeMap;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::{MetaError, MetaResult};
use crate::core::key::XmpKey;
use crate::core::metadata::{XmpData, ADDED};
use crate::core::namespace::{prefix_for_uri, register_namespace, NamespaceMap};
use crate::types::value::ValueData;
use crate::types::{TypeId, Value};

/// A property or array item that collects text and children
#[derive(Debug)]
struct Property {
    /// Key prefix of the top-level property
    prefix: String,
    /// Property path below the prefix
    path: String,
    text: String,
    array: Option<TypeId>,
    items: Vec<(Option<String>, String)>,
    item_count: usize,
    is_struct: bool,
    lang: Option<String>,
}

impl Property {
    fn new(prefix: String, path: String) -> Self {
        Self {
            prefix,
            path,
            text: String::new(),
            array: None,
            items: Vec::new(),
            item_count: 0,
            is_struct: false,
            lang: None,
        }
    }
}

#[derive(Debug)]
enum Frame {
    /// x:xmpmeta, rdf:RDF and unknown wrappers
    Outer,
    /// rdf:Description; `base` is the enclosing structure, if any
    Description { base: Option<(String, String)> },
    Property(Property),
    /// rdf:Bag, rdf:Seq or rdf:Alt
    Container,
    Item(Property),
}

/// Parser for XMP packets
pub struct XmpParser {
    namespaces: NamespaceMap,
    stack: Vec<Frame>,
    xmp: XmpData,
}

impl XmpParser {
    pub fn new() -> Self {
        Self {
            namespaces: NamespaceMap::with_builtins(),
            stack: Vec::new(),
            xmp: XmpData::new(),
        }
    }

    /// Parse an XMP packet, with or without its `<?xpacket?>` wrapper
    pub fn parse_packet(mut self, xml: &str) -> MetaResult<XmpData> {
        let content = Self::extract_packet_content(xml)?;
        self.parse_rdf(content)?;
        log::debug!("Parsed {} XMP properties", self.xmp.len());
        Ok(self.xmp)
    }

    /// Content between the `<?xpacket begin?>` and `<?xpacket end?>` markers
    fn extract_packet_content(xml: &str) -> MetaResult<&str> {
        let content = xml
            .find("<?xpacket")
            .and_then(|start| {
                let pi_end = start + xml[start..].find("?>")? + 2;
                let close = xml[pi_end..].find("<?xpacket end")?;
                Some(&xml[pi_end..pi_end + close])
            })
            .unwrap_or(xml)
            .trim()
            .trim_start_matches('\u{feff}');

        if !content.starts_with('<') {
            return Err(MetaError::ParseError("Invalid XML content".to_string()));
        }
        Ok(content)
    }

    fn parse_rdf(&mut self, xml: &str) -> MetaResult<()> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => self.start_element(&e)?,
                Ok(Event::Empty(e)) => {
                    self.start_element(&e)?;
                    self.end_element()?;
                }
                Ok(Event::End(_)) => self.end_element()?,
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    let text = unescape(&raw)
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    self.push_text(&text);
                }
                Ok(Event::CData(e)) => {
                    self.push_text(&String::from_utf8_lossy(e.as_ref()));
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = String::from_utf8_lossy(e.as_ref()).to_string();
                    let resolved = match e.resolve_char_ref() {
                        Ok(Some(ch)) => Some(ch.to_string()),
                        _ => resolve_predefined_entity(&name).map(str::to_string),
                    };
                    match resolved {
                        Some(text) => self.push_text(&text),
                        None => {
                            return Err(MetaError::ParseError(format!(
                                "Unknown entity &{};",
                                name
                            )))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MetaError::ParseError(format!("XML parsing error: {}", e)));
                }
                _ => {}
            }
            buf.clear();
        }

        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(MetaError::ParseError("Unexpected end of XMP packet".to_string()))
        }
    }

    fn push_text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::Property(p)) | Some(Frame::Item(p)) => p.text.push_str(text),
            _ => {}
        }
    }

    fn start_element(&mut self, e: &BytesStart<'_>) -> MetaResult<()> {
        let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attrs = Self::collect_attributes(e);
        self.process_namespaces(&attrs);

        let frame = match self.stack.last_mut() {
            None | Some(Frame::Outer) => {
                if is_description_element(&name) {
                    self.description_attributes(&attrs, None)?;
                    Frame::Description { base: None }
                } else {
                    Frame::Outer
                }
            }
            Some(Frame::Description { base }) => {
                let base = base.clone();
                self.property_frame(&name, &attrs, base)?
            }
            Some(Frame::Property(p)) | Some(Frame::Item(p)) => {
                if let Some(kind) = array_kind(&name) {
                    p.array = Some(kind);
                    Frame::Container
                } else {
                    p.is_struct = true;
                    let base = Some((p.prefix.clone(), p.path.clone()));
                    if is_description_element(&name) {
                        self.description_attributes(&attrs, base.clone())?;
                        Frame::Description { base }
                    } else {
                        self.property_frame(&name, &attrs, base)?
                    }
                }
            }
            Some(Frame::Container) => {
                let Some(Frame::Property(p) | Frame::Item(p)) = self.stack.iter_mut().rev().nth(1)
                else {
                    return Err(MetaError::ParseError(format!(
                        "Array container outside a property at <{}>",
                        name
                    )));
                };
                if !is_li_element(&name) {
                    return Err(MetaError::ParseError(format!(
                        "Expected rdf:li in array, found <{}>",
                        name
                    )));
                }
                p.item_count += 1;
                let mut item = Property::new(
                    p.prefix.clone(),
                    format!("{}[{}]", p.path, p.item_count),
                );
                item.lang = attr(&attrs, is_lang_attribute).map(str::to_string);
                item.is_struct = attr(&attrs, |n| n == "rdf:parseType") == Some("Resource");

                let base = (item.prefix.clone(), item.path.clone());
                let fields = self.simple_fields(&attrs, Some(&base));
                if !fields.is_empty() {
                    item.is_struct = true;
                    for (prefix, path, text) in fields {
                        self.add_text(&prefix, &path, text)?;
                    }
                }
                Frame::Item(item)
            }
        };
        self.stack.push(frame);
        Ok(())
    }

    fn end_element(&mut self) -> MetaResult<()> {
        match self.stack.pop() {
            Some(Frame::Property(p)) => self.finish_property(p),
            Some(Frame::Item(item)) => {
                if !item.is_struct {
                    if let Some(Frame::Property(p) | Frame::Item(p)) =
                        self.stack.iter_mut().rev().nth(1)
                    {
                        p.items.push((item.lang, item.text.trim().to_string()));
                    }
                }
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(MetaError::ParseError("Unbalanced end tag".to_string())),
        }
    }

    /// Start a property element under a description or structure
    fn property_frame(
        &mut self,
        name: &str,
        attrs: &[(String, String)],
        base: Option<(String, String)>,
    ) -> MetaResult<Frame> {
        let Some((prefix, path)) = self.property_path(name, base.as_ref()) else {
            log::debug!("Skipping XMP property <{}> in an unknown namespace", name);
            // Children still need a frame to pair with their end tags
            return Ok(Frame::Outer);
        };

        let mut property = Property::new(prefix, path);
        if let Some(resource) = attr(attrs, |n| n == "rdf:resource") {
            property.text = resource.to_string();
        }
        if attr(attrs, |n| n == "rdf:parseType") == Some("Resource") {
            property.is_struct = true;
        }

        let base = Some((property.prefix.clone(), property.path.clone()));
        let fields = self.simple_fields(attrs, base.as_ref());
        if !fields.is_empty() {
            property.is_struct = true;
            for (prefix, path, text) in fields {
                self.add_text(&prefix, &path, text)?;
            }
        }
        Ok(Frame::Property(property))
    }

    /// Attribute-form properties of an rdf:Description
    fn description_attributes(
        &mut self,
        attrs: &[(String, String)],
        base: Option<(String, String)>,
    ) -> MetaResult<()> {
        for (prefix, path, text) in self.simple_fields(attrs, base.as_ref()) {
            self.add_text(&prefix, &path, text)?;
        }
        Ok(())
    }

    fn simple_fields(
        &self,
        attrs: &[(String, String)],
        base: Option<&(String, String)>,
    ) -> Vec<(String, String, String)> {
        attrs
            .iter()
            .filter(|(name, _)| !should_skip_attribute(name))
            .filter_map(|(name, value)| {
                let (prefix, path) = self.property_path(name, base)?;
                Some((prefix, path, value.clone()))
            })
            .collect()
    }

    /// Key prefix and property path for a qualified element or attribute name
    fn property_path(
        &self,
        qname: &str,
        base: Option<&(String, String)>,
    ) -> Option<(String, String)> {
        let (doc_prefix, local) = qname.split_once(':')?;
        let uri = self.namespaces.uri(doc_prefix)?;
        let prefix = match prefix_for_uri(uri) {
            Some(prefix) => prefix,
            None => {
                register_namespace(uri, doc_prefix).ok()?;
                doc_prefix.to_string()
            }
        };

        Some(match base {
            None => (prefix, local.to_string()),
            Some((base_prefix, base_path)) => (
                base_prefix.clone(),
                format!("{}/{}:{}", base_path, prefix, local),
            ),
        })
    }

    fn finish_property(&mut self, p: Property) -> MetaResult<()> {
        let value = match p.array {
            Some(TypeId::XmpAlt) if !p.items.is_empty() && p.items.iter().all(|(l, _)| l.is_some()) => {
                let map: BTreeMap<String, String> = p
                    .items
                    .into_iter()
                    .filter_map(|(lang, text)| lang.map(|l| (l, text)))
                    .collect();
                Value::with_data(TypeId::LangAlt, ValueData::LangAlt(map))
            }
            Some(_) if p.is_struct_array() => return Ok(()),
            Some(kind) => Value::with_data(
                kind,
                ValueData::Items(p.items.into_iter().map(|(_, text)| text).collect()),
            ),
            None if p.is_struct => return Ok(()),
            None => {
                return self.add_text(&p.prefix, &p.path, p.text.trim().to_string());
            }
        };
        self.add(&p.prefix, &p.path, value)
    }

    fn add_text(&mut self, prefix: &str, path: &str, text: String) -> MetaResult<()> {
        self.add(
            prefix,
            path,
            Value::with_data(TypeId::XmpText, ValueData::Text(text)),
        )
    }

    fn add(&mut self, prefix: &str, path: &str, value: Value) -> MetaResult<()> {
        let key = XmpKey::parse(&format!("Xmp.{}.{}", prefix, path))?;
        if self.xmp.add(key, value) != ADDED {
            log::debug!("Dropping XMP property {}.{}", prefix, path);
        }
        Ok(())
    }

    fn process_namespaces(&mut self, attrs: &[(String, String)]) {
        for (name, value) in attrs {
            if let Some(prefix) = name.strip_prefix("xmlns:") {
                // Documents may rebind a builtin prefix; the last binding wins
                self.namespaces.bind(value, prefix);
            }
        }
    }

    fn collect_attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
        e.attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                let raw_value = String::from_utf8_lossy(attr.value.as_ref());
                let value = match unescape(&raw_value) {
                    Ok(unescaped) => unescaped.to_string(),
                    Err(_) => raw_value.to_string(),
                };
                (key, value)
            })
            .collect()
    }
}

impl Property {
    /// Items were structures rather than text
    fn is_struct_array(&self) -> bool {
        self.items.is_empty() && self.item_count > 0
    }
}

impl Default for XmpParser {
    fn default() -> Self {
        Self::new()
    }
}

fn attr<'a>(attrs: &'a [(String, String)], pred: impl Fn(&str) -> bool) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| pred(name))
        .map(|(_, value)| value.as_str())
}

fn is_description_element(name: &str) -> bool {
    name == "rdf:Description"
}

fn is_li_element(name: &str) -> bool {
    name == "rdf:li"
}

fn is_lang_attribute(name: &str) -> bool {
    name == "xml:lang"
}

fn array_kind(name: &str) -> Option<TypeId> {
    match name {
        "rdf:Bag" => Some(TypeId::XmpBag),
        "rdf:Seq" => Some(TypeId::XmpSeq),
        "rdf:Alt" => Some(TypeId::XmpAlt),
        _ => None,
    }
}

fn should_skip_attribute(name: &str) -> bool {
    name == "xmlns"
        || name.starts_with("xmlns:")
        || name.starts_with("rdf:")
        || name.starts_with("xml:")
}
