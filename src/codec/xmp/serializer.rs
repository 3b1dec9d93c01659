//! XMP packet serializer
//!
//! Writes an XMP store as a single `rdf:Description`. Simple top-level
//! text properties become attributes; arrays, language alternatives and
//! structures become elements. Flattened `Struct/ns:Field` and
//! `Array[n]/ns:Field` paths are folded back into nested elements.

use std::collections::BTreeMap;
use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::core::error::{MetaError, MetaResult};
use crate::core::metadata::XmpData;
use crate::core::namespace::{ns, uri_for_prefix};
use crate::core::tags::xmp as xmp_properties;
use crate::types::value::ValueData;
use crate::types::{TypeId, Value, X_DEFAULT};

const PACKET_HEADER: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>"#;
const PACKET_TRAILER: &str = r#"<?xpacket end="w"?>"#;

/// Property tree rebuilt from flattened paths
#[derive(Debug, Default)]
struct Tree<'a> {
    children: Vec<(String, Node<'a>)>,
}

#[derive(Debug)]
enum Node<'a> {
    Leaf(&'a Value),
    Struct(Tree<'a>),
    /// Array of structures, with the array type
    Array(TypeId, Vec<Tree<'a>>),
}

impl<'a> Tree<'a> {
    fn child(&mut self, qname: &str, make: impl FnOnce() -> Node<'a>) -> &mut Node<'a> {
        let pos = match self.children.iter().position(|(n, _)| n == qname) {
            Some(pos) => pos,
            None => {
                self.children.push((qname.to_string(), make()));
                self.children.len() - 1
            }
        };
        &mut self.children[pos].1
    }

    /// Insert a value at `segments`, creating structures and array items
    fn insert(&mut self, prefix: &str, segments: &[&str], value: &'a Value) -> MetaResult<()> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(());
        };
        let (name, index) = split_index(first)?;

        match index {
            None if rest.is_empty() => {
                self.children.push((name.to_string(), Node::Leaf(value)));
            }
            None => {
                let Node::Struct(tree) = self.child(name, || Node::Struct(Tree::default())) else {
                    return Err(MetaError::SerializationError(format!(
                        "XMP property {} is both a value and a structure",
                        name
                    )));
                };
                tree.insert(prefix, rest, value)?;
            }
            Some(index) => {
                let kind = array_type(prefix, name);
                let Node::Array(_, items) = self.child(name, || Node::Array(kind, Vec::new()))
                else {
                    return Err(MetaError::SerializationError(format!(
                        "XMP property {} is both a value and an array",
                        name
                    )));
                };
                if items.len() < index {
                    items.resize_with(index, Tree::default);
                }
                items[index - 1].insert(prefix, rest, value)?;
            }
        }
        Ok(())
    }
}

/// Split `name[n]` into name and 1-based index
fn split_index(segment: &str) -> MetaResult<(&str, Option<usize>)> {
    let Some(open) = segment.find('[') else {
        return Ok((segment, None));
    };
    let index = segment[open + 1..]
        .strip_suffix(']')
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            MetaError::SerializationError(format!("Bad XMP array index in {}", segment))
        })?;
    Ok((&segment[..open], Some(index)))
}

fn array_type(prefix: &str, qname: &str) -> TypeId {
    let property = qname.rsplit(':').next().unwrap_or(qname);
    match xmp_properties::property_type(prefix, property) {
        t if t.is_xmp_array() => t,
        _ => TypeId::XmpSeq,
    }
}

/// Serializer for XMP packets
pub struct XmpSerializer {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmpSerializer {
    pub fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    /// Serialize to XMP packet format
    pub fn serialize_packet(self, xmp: &XmpData) -> MetaResult<String> {
        let rdf_content = self.serialize_rdf(xmp)?;
        Ok(format!("{}\n{}\n{}", PACKET_HEADER, rdf_content, PACKET_TRAILER))
    }

    /// Serialize to `x:xmpmeta` RDF/XML
    pub fn serialize_rdf(mut self, xmp: &XmpData) -> MetaResult<String> {
        let mut tree = Tree::default();
        let mut prefixes: Vec<String> = Vec::new();
        for datum in xmp {
            let key = datum.key();
            let path = format!("{}:{}", key.prefix(), key.property());
            let segments: Vec<&str> = path.split('/').collect();
            for segment in &segments {
                if let Some((prefix, _)) = segment.split_once(':') {
                    if !prefixes.iter().any(|p| p == prefix) {
                        prefixes.push(prefix.to_string());
                    }
                }
            }
            tree.insert(key.prefix(), &segments, datum.value())?;
        }

        let mut meta_start = BytesStart::new("x:xmpmeta");
        meta_start.push_attribute(("xmlns:x", ns::ADOBE_META));
        self.writer.write_event(Event::Start(meta_start))?;

        let mut rdf_start = BytesStart::new("rdf:RDF");
        rdf_start.push_attribute(("xmlns:rdf", ns::RDF));
        self.writer.write_event(Event::Start(rdf_start))?;

        let mut desc_start = BytesStart::new("rdf:Description");
        desc_start.push_attribute(("rdf:about", ""));
        for prefix in &prefixes {
            let uri = uri_for_prefix(prefix).ok_or_else(|| {
                MetaError::SerializationError(format!("No namespace registered for {}", prefix))
            })?;
            desc_start.push_attribute((format!("xmlns:{}", prefix).as_str(), uri.as_str()));
        }

        // Simple top-level text goes into attributes
        let (attributes, elements): (Vec<_>, Vec<_>) =
            tree.children.iter().partition(|(_, node)| is_attribute(node));
        for (name, node) in &attributes {
            if let Node::Leaf(value) = node {
                desc_start.push_attribute((name.as_str(), value.to_string().as_str()));
            }
        }

        if elements.is_empty() {
            self.writer.write_event(Event::Empty(desc_start))?;
        } else {
            self.writer.write_event(Event::Start(desc_start))?;
            for (name, node) in &elements {
                self.serialize_node(name, node)?;
            }
            self.writer
                .write_event(Event::End(BytesEnd::new("rdf:Description")))?;
        }
        self.writer.write_event(Event::End(BytesEnd::new("rdf:RDF")))?;
        self.writer
            .write_event(Event::End(BytesEnd::new("x:xmpmeta")))?;

        let result = self.writer.into_inner().into_inner();
        String::from_utf8(result)
            .map_err(|e| MetaError::SerializationError(format!("UTF-8 encoding error: {}", e)))
    }

    fn serialize_node(&mut self, name: &str, node: &Node<'_>) -> MetaResult<()> {
        match node {
            Node::Leaf(value) => self.serialize_value(name, value),
            Node::Struct(tree) => {
                let mut start = BytesStart::new(name);
                start.push_attribute(("rdf:parseType", "Resource"));
                self.writer.write_event(Event::Start(start))?;
                self.serialize_fields(tree)?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                Ok(())
            }
            Node::Array(kind, items) => {
                self.writer
                    .write_event(Event::Start(BytesStart::new(name)))?;
                let container = container_name(*kind);
                self.writer
                    .write_event(Event::Start(BytesStart::new(container)))?;
                for item in items {
                    let mut li = BytesStart::new("rdf:li");
                    li.push_attribute(("rdf:parseType", "Resource"));
                    self.writer.write_event(Event::Start(li))?;
                    self.serialize_fields(item)?;
                    self.writer.write_event(Event::End(BytesEnd::new("rdf:li")))?;
                }
                self.writer.write_event(Event::End(BytesEnd::new(container)))?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
                Ok(())
            }
        }
    }

    fn serialize_fields(&mut self, tree: &Tree<'_>) -> MetaResult<()> {
        for (name, node) in &tree.children {
            self.serialize_node(name, node)?;
        }
        Ok(())
    }

    fn serialize_value(&mut self, name: &str, value: &Value) -> MetaResult<()> {
        match value.data() {
            ValueData::Items(items) => {
                let container = container_name(value.type_id());
                self.writer
                    .write_event(Event::Start(BytesStart::new(name)))?;
                self.writer
                    .write_event(Event::Start(BytesStart::new(container)))?;
                for item in items {
                    self.write_text_element("rdf:li", None, item)?;
                }
                self.writer.write_event(Event::End(BytesEnd::new(container)))?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            ValueData::LangAlt(map) => {
                self.writer
                    .write_event(Event::Start(BytesStart::new(name)))?;
                self.writer
                    .write_event(Event::Start(BytesStart::new("rdf:Alt")))?;
                for (lang, text) in lang_alt_order(map) {
                    self.write_text_element("rdf:li", Some(lang), text)?;
                }
                self.writer
                    .write_event(Event::End(BytesEnd::new("rdf:Alt")))?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            _ => self.write_text_element(name, None, &value.to_string())?,
        }
        Ok(())
    }

    fn write_text_element(&mut self, name: &str, lang: Option<&str>, text: &str) -> MetaResult<()> {
        let mut start = BytesStart::new(name);
        if let Some(lang) = lang {
            start.push_attribute(("xml:lang", lang));
        }
        self.writer.write_event(Event::Start(start))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

impl Default for XmpSerializer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_attribute(node: &Node<'_>) -> bool {
    match node {
        Node::Leaf(value) => !matches!(
            value.data(),
            ValueData::Items(_) | ValueData::LangAlt(_)
        ),
        _ => false,
    }
}

fn container_name(kind: TypeId) -> &'static str {
    match kind {
        TypeId::XmpBag => "rdf:Bag",
        TypeId::XmpAlt | TypeId::LangAlt => "rdf:Alt",
        _ => "rdf:Seq",
    }
}

/// `x-default` first, then the other languages in order
fn lang_alt_order(map: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    let default = map
        .get_key_value(X_DEFAULT)
        .map(|(l, t)| (l.as_str(), t.as_str()));
    default
        .into_iter()
        .chain(
            map.iter()
                .filter(|(l, _)| l.as_str() != X_DEFAULT)
                .map(|(l, t)| (l.as_str(), t.as_str())),
        )
        .collect()
}
