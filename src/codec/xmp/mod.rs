//! XMP codec
//!
//! XMP packets are RDF/XML documents wrapped in `<?xpacket?>` processing
//! instructions.

mod parser;
mod serializer;

pub use parser::XmpParser;
pub use serializer::XmpSerializer;

use crate::core::error::MetaResult;
use crate::core::metadata::XmpData;

/// Parse an XMP packet into a store
pub fn decode(packet: &str) -> MetaResult<XmpData> {
    XmpParser::new().parse_packet(packet)
}

/// Serialize a store as an XMP packet; an empty store gives an empty string
pub fn encode(xmp: &XmpData) -> MetaResult<String> {
    if xmp.is_empty() {
        return Ok(String::new());
    }
    XmpSerializer::new().serialize_packet(xmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::key::XmpKey;
    use crate::types::{TypeId, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_survives_reparse() {
        let mut xmp = XmpData::new();
        let mut title = Value::create(TypeId::LangAlt);
        title.read("Pickled").unwrap();
        title.read("lang=\"ab-CE\" Eingelegt").unwrap();
        xmp.add(XmpKey::parse("Xmp.dc.title").unwrap(), title);
        let mut subject = Value::create(TypeId::XmpBag);
        subject.read("kw1").unwrap();
        subject.read("kw2").unwrap();
        xmp.add(XmpKey::parse("Xmp.dc.subject").unwrap(), subject);
        let mut rating = Value::create(TypeId::XmpText);
        rating.read("3").unwrap();
        xmp.add(XmpKey::parse("Xmp.xmp.Rating").unwrap(), rating);

        let packet = encode(&xmp).unwrap();
        let decoded = decode(&packet).unwrap();

        // Attribute-form properties come first after a reparse
        let entries: Vec<(String, String)> = decoded
            .iter()
            .map(|d| (d.key().to_string(), d.value().to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("Xmp.xmp.Rating".to_string(), "3".to_string()),
                (
                    "Xmp.dc.title".to_string(),
                    "lang=\"ab-CE\" Eingelegt, lang=\"x-default\" Pickled".to_string()
                ),
                ("Xmp.dc.subject".to_string(), "kw1, kw2".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_store_encodes_to_nothing() {
        assert_eq!(encode(&XmpData::new()).unwrap(), "");
    }
}
