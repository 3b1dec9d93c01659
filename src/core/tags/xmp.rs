//! XMP property types
//!
//! Properties not listed here are simple text.

use crate::types::TypeId;

use TypeId::{LangAlt, XmpBag as Bag, XmpSeq as Seq};

static PROPERTIES: &[(&str, &str, TypeId)] = &[
    ("dc", "title", LangAlt),
    ("dc", "description", LangAlt),
    ("dc", "rights", LangAlt),
    ("dc", "subject", Bag),
    ("dc", "creator", Seq),
    ("dc", "contributor", Bag),
    ("dc", "publisher", Bag),
    ("dc", "date", Seq),
    ("dc", "language", Bag),
    ("dc", "relation", Bag),
    ("dc", "type", Bag),
    ("xmp", "Identifier", Bag),
    ("xmp", "Advisory", Bag),
    ("xmp", "Title", LangAlt),
    ("xmpRights", "Owner", Bag),
    ("xmpRights", "UsageTerms", LangAlt),
    ("photoshop", "SupplementalCategories", Bag),
    ("Iptc4xmpCore", "Scene", Bag),
    ("Iptc4xmpCore", "SubjectCode", Bag),
    ("tiff", "ImageDescription", LangAlt),
    ("tiff", "Copyright", LangAlt),
    ("tiff", "BitsPerSample", Seq),
    ("tiff", "YCbCrSubSampling", Seq),
    ("exif", "UserComment", LangAlt),
    ("exif", "ISOSpeedRatings", Seq),
    ("exif", "ComponentsConfiguration", Seq),
    ("exif", "SubjectArea", Seq),
    ("exif", "SubjectLocation", Seq),
    ("xmpMM", "History", Seq),
    ("xmpMM", "Versions", Seq),
];

/// Type of `Xmp.<prefix>.<property>`
pub fn property_type(prefix: &str, property: &str) -> TypeId {
    PROPERTIES
        .iter()
        .find(|(p, name, _)| *p == prefix && *name == property)
        .map(|(_, _, type_id)| *type_id)
        .unwrap_or(TypeId::XmpText)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_types() {
        assert_eq!(property_type("dc", "title"), TypeId::LangAlt);
        assert_eq!(property_type("dc", "subject"), TypeId::XmpBag);
        assert_eq!(property_type("dc", "creator"), TypeId::XmpSeq);
        assert_eq!(property_type("xmp", "CreatorTool"), TypeId::XmpText);
        assert_eq!(property_type("ex", "anything"), TypeId::XmpText);
    }
}
