//! Structured metadata keys
//!
//! Every metadata entry is addressed by a key with a canonical string form:
//!
//! - `Exif.<Group>.<Tag>`, e.g. `Exif.Photo.ExposureTime`
//! - `Iptc.<Record>.<DataSet>`, e.g. `Iptc.Application2.Keywords`
//! - `Xmp.<prefix>.<Property>`, e.g. `Xmp.dc.title`
//!
//! Unknown Exif tags and IPTC datasets may be written as `0xNNNN`.

use std::fmt;
use std::str::FromStr;

use crate::core::error::{MetaError, MetaResult};
use crate::core::namespace::uri_for_prefix;
use crate::core::tags::{exif as exif_tags, iptc as iptc_datasets, xmp as xmp_properties};
use crate::core::tags::ExifGroup;
use crate::types::TypeId;

fn split_key<'a>(key: &'a str, family: &str) -> MetaResult<(&'a str, &'a str)> {
    let mut parts = key.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(f), Some(group), Some(name)) if f == family && !group.is_empty() && !name.is_empty() => {
            Ok((group, name))
        }
        _ => Err(MetaError::InvalidKey(key.to_string())),
    }
}

fn parse_number(s: &str) -> Option<u16> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None if s.bytes().all(|b| b.is_ascii_digit()) => s.parse().ok(),
        None => None,
    }
}

/// Key of an Exif entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExifKey {
    group: ExifGroup,
    tag: u16,
}

impl ExifKey {
    pub fn new(group: ExifGroup, tag: u16) -> Self {
        Self { group, tag }
    }

    /// Parse `Exif.<Group>.<Tag>`
    ///
    /// # Example
    ///
    /// ```rust
    /// use metakit::core::key::ExifKey;
    ///
    /// let key = ExifKey::parse("Exif.Image.Software").unwrap();
    /// assert_eq!(key.tag(), 0x0131);
    /// assert_eq!(ExifKey::parse("Exif.Image.0x0131").unwrap(), key);
    /// ```
    pub fn parse(key: &str) -> MetaResult<Self> {
        let (group, name) = split_key(key, "Exif")?;
        let group =
            ExifGroup::from_name(group).ok_or_else(|| MetaError::InvalidKey(key.to_string()))?;
        let tag = exif_tags::tag_by_name(group, name)
            .map(|info| info.tag)
            .or_else(|| name.strip_prefix("0x").and_then(|hex| u16::from_str_radix(hex, 16).ok()))
            .ok_or_else(|| MetaError::InvalidKey(key.to_string()))?;
        Ok(Self { group, tag })
    }

    pub fn group(&self) -> ExifGroup {
        self.group
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Dictionary name of the tag, if known
    pub fn tag_name(&self) -> Option<&'static str> {
        exif_tags::tag_info(self.group, self.tag).map(|info| info.name)
    }

    /// Type used for new values of this key
    pub fn default_type_id(&self) -> TypeId {
        exif_tags::default_type(self.group, self.tag)
    }
}

impl fmt::Display for ExifKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag_name() {
            Some(name) => write!(f, "Exif.{}.{}", self.group, name),
            None => write!(f, "Exif.{}.0x{:04x}", self.group, self.tag),
        }
    }
}

impl FromStr for ExifKey {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Key of an IPTC dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IptcKey {
    record: u16,
    tag: u16,
}

impl IptcKey {
    pub fn new(tag: u16, record: u16) -> Self {
        Self { record, tag }
    }

    /// Parse `Iptc.<Record>.<DataSet>`
    pub fn parse(key: &str) -> MetaResult<Self> {
        let (record, name) = split_key(key, "Iptc")?;
        let record =
            iptc_datasets::record_id(record).ok_or_else(|| MetaError::InvalidKey(key.to_string()))?;
        let tag = iptc_datasets::dataset_by_name(name, record)
            .map(|info| info.number)
            .or_else(|| parse_number(name))
            .ok_or_else(|| MetaError::InvalidKey(key.to_string()))?;
        Ok(Self { record, tag })
    }

    pub fn record(&self) -> u16 {
        self.record
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Dataset value type
    pub fn type_id(&self) -> TypeId {
        iptc_datasets::dataset_type(self.tag, self.record)
    }

    pub fn is_repeatable(&self) -> bool {
        iptc_datasets::is_repeatable(self.tag, self.record)
    }
}

impl fmt::Display for IptcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = iptc_datasets::record_name(self.record).unwrap_or("Unknown");
        match iptc_datasets::dataset_info(self.tag, self.record) {
            Some(info) => write!(f, "Iptc.{}.{}", record, info.name),
            None => write!(f, "Iptc.{}.0x{:04x}", record, self.tag),
        }
    }
}

impl FromStr for IptcKey {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Key of an XMP property
///
/// The property part may be a path into a structure or array, such as
/// `History[1]/stEvt:action`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmpKey {
    prefix: String,
    property: String,
}

impl XmpKey {
    /// Parse `Xmp.<prefix>.<Property>`; the prefix must be registered
    pub fn parse(key: &str) -> MetaResult<Self> {
        let (prefix, property) = split_key(key, "Xmp")?;
        if uri_for_prefix(prefix).is_none() {
            return Err(MetaError::InvalidKey(format!(
                "{} (no namespace registered for prefix '{}')",
                key, prefix
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            property: property.to_string(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn namespace_uri(&self) -> Option<String> {
        uri_for_prefix(&self.prefix)
    }

    /// Property type from the XMP property dictionary
    pub fn type_id(&self) -> TypeId {
        xmp_properties::property_type(&self.prefix, &self.property)
    }
}

impl fmt::Display for XmpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xmp.{}.{}", self.prefix, self.property)
    }
}

impl FromStr for XmpKey {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exif_key_parse_and_display() {
        let key = ExifKey::parse("Exif.GPSInfo.GPSLatitude").unwrap();
        assert_eq!(key.group(), ExifGroup::GpsInfo);
        assert_eq!(key.tag(), 0x0002);
        assert_eq!(key.default_type_id(), TypeId::UnsignedRational);
        assert_eq!(key.to_string(), "Exif.GPSInfo.GPSLatitude");
    }

    #[test]
    fn test_exif_key_hex_tag() {
        let key = ExifKey::parse("Exif.Photo.0xbeef").unwrap();
        assert_eq!(key.tag(), 0xbeef);
        assert_eq!(key.to_string(), "Exif.Photo.0xbeef");
        assert_eq!(key.default_type_id(), TypeId::Undefined);
    }

    #[test]
    fn test_exif_key_invalid() {
        assert!(ExifKey::parse("Exif.Image").is_err());
        assert!(ExifKey::parse("Exif.Nowhere.Software").is_err());
        assert!(ExifKey::parse("Exif.Image.NoSuchTag").is_err());
        assert!(ExifKey::parse("Iptc.Image.Software").is_err());
        assert!(matches!(
            ExifKey::parse("garbage"),
            Err(MetaError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_iptc_key() {
        let key = IptcKey::parse("Iptc.Application2.Keywords").unwrap();
        assert_eq!((key.record(), key.tag()), (2, 25));
        assert!(key.is_repeatable());
        assert_eq!(key.to_string(), "Iptc.Application2.Keywords");

        let numeric = IptcKey::parse("Iptc.Application2.120").unwrap();
        assert_eq!(numeric.to_string(), "Iptc.Application2.Caption");

        let unknown = IptcKey::parse("Iptc.Application2.0x00c8").unwrap();
        assert_eq!(unknown.tag(), 200);
        assert_eq!(unknown.to_string(), "Iptc.Application2.0x00c8");

        assert!(IptcKey::parse("Iptc.Nowhere.Keywords").is_err());
        assert!(IptcKey::parse("Iptc.Application2.Nope").is_err());
    }

    #[test]
    fn test_xmp_key() {
        let key = XmpKey::parse("Xmp.dc.title").unwrap();
        assert_eq!(key.prefix(), "dc");
        assert_eq!(key.property(), "title");
        assert_eq!(key.type_id(), TypeId::LangAlt);
        assert_eq!(
            key.namespace_uri().as_deref(),
            Some("http://purl.org/dc/elements/1.1/")
        );
        assert_eq!(key.to_string(), "Xmp.dc.title");

        let path = XmpKey::parse("Xmp.xmpMM.History[1]/stEvt:action").unwrap();
        assert_eq!(path.property(), "History[1]/stEvt:action");

        assert!(XmpKey::parse("Xmp.nosuchprefix.title").is_err());
        assert!(XmpKey::parse("Xmp.dc").is_err());
    }
}
