//! Metadata stores
//!
//! Each store is an ordered list of key/value pairs. Order is the order in
//! which entries were decoded or added, and is preserved on write where the
//! format allows it.

use std::slice;

use crate::core::key::{ExifKey, IptcKey, XmpKey};
use crate::types::{TypeId, Value};

/// Status returned by `add` when an entry was stored
pub const ADDED: i32 = 0;
/// Status returned when a non-repeatable IPTC dataset already exists
pub const REJECTED_DUPLICATE: i32 = 6;
/// Status returned when the value has no usable type
pub const REJECTED_INVALID: i32 = 2;

/// One key/value entry
#[derive(Debug, Clone, PartialEq)]
pub struct Datum<K> {
    key: K,
    value: Value,
}

impl<K> Datum<K> {
    pub fn new(key: K, value: Value) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Shared ordered-list operations of the three stores
macro_rules! impl_store {
    ($store:ident, $key:ty) => {
        impl $store {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn iter(&self) -> slice::Iter<'_, Datum<$key>> {
                self.data.iter()
            }

            pub fn len(&self) -> usize {
                self.data.len()
            }

            pub fn is_empty(&self) -> bool {
                self.data.is_empty()
            }

            pub fn clear(&mut self) {
                self.data.clear();
            }

            /// Entry at `index`, in store order
            pub fn get(&self, index: usize) -> Option<&Datum<$key>> {
                self.data.get(index)
            }

            /// Index of the first entry with this key
            pub fn find_key(&self, key: &$key) -> Option<usize> {
                self.data.iter().position(|d| d.key() == key)
            }

            /// Remove and return the entry at `index`
            pub fn erase(&mut self, index: usize) -> Option<Datum<$key>> {
                if index < self.data.len() {
                    Some(self.data.remove(index))
                } else {
                    None
                }
            }
        }

        impl<'a> IntoIterator for &'a $store {
            type Item = &'a Datum<$key>;
            type IntoIter = slice::Iter<'a, Datum<$key>>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

/// Exif entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    data: Vec<Datum<ExifKey>>,
}

impl_store!(ExifData, ExifKey);

impl ExifData {
    /// Append an entry; duplicates are allowed
    pub fn add(&mut self, key: ExifKey, value: Value) -> i32 {
        self.data.push(Datum::new(key, value));
        ADDED
    }
}

/// IPTC datasets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IptcData {
    data: Vec<Datum<IptcKey>>,
}

impl_store!(IptcData, IptcKey);

impl IptcData {
    /// Append a dataset
    ///
    /// A non-repeatable dataset that is already present is rejected with
    /// [`REJECTED_DUPLICATE`].
    pub fn add(&mut self, key: IptcKey, value: Value) -> i32 {
        if !key.is_repeatable() && self.find_key(&key).is_some() {
            return REJECTED_DUPLICATE;
        }
        self.data.push(Datum::new(key, value));
        ADDED
    }

    /// Stable sort by record number, keeping dataset order within a record
    pub fn sort_by_key(&mut self) {
        self.data.sort_by_key(|d| d.key().record());
    }
}

/// XMP properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpData {
    data: Vec<Datum<XmpKey>>,
}

impl_store!(XmpData, XmpKey);

impl XmpData {
    /// Append a property; a value of type [`TypeId::Invalid`] is rejected
    pub fn add(&mut self, key: XmpKey, value: Value) -> i32 {
        if value.type_id() == TypeId::Invalid {
            return REJECTED_INVALID;
        }
        self.data.push(Datum::new(key, value));
        ADDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namespace::ensure_registry;

    fn text(type_id: TypeId, s: &str) -> Value {
        let mut v = Value::create(type_id);
        v.read(s).unwrap();
        v
    }

    #[test]
    fn test_exif_store_allows_duplicates() {
        let key = ExifKey::parse("Exif.Image.Software").unwrap();
        let mut exif = ExifData::new();
        assert_eq!(exif.add(key, text(TypeId::AsciiString, "a")), ADDED);
        assert_eq!(exif.add(key, text(TypeId::AsciiString, "b")), ADDED);
        assert_eq!(exif.len(), 2);
        assert_eq!(exif.find_key(&key), Some(0));

        let removed = exif.erase(0).unwrap();
        assert_eq!(removed.value().to_string(), "a");
        assert_eq!(exif.get(0).unwrap().value().to_string(), "b");
        assert!(exif.erase(5).is_none());
    }

    #[test]
    fn test_iptc_store_rejects_non_repeatable_duplicate() {
        let caption = IptcKey::parse("Iptc.Application2.Caption").unwrap();
        let keywords = IptcKey::parse("Iptc.Application2.Keywords").unwrap();
        let mut iptc = IptcData::new();

        assert_eq!(iptc.add(caption, text(TypeId::String, "one")), ADDED);
        assert_eq!(
            iptc.add(caption, text(TypeId::String, "two")),
            REJECTED_DUPLICATE
        );
        assert_eq!(iptc.add(keywords, text(TypeId::String, "k1")), ADDED);
        assert_eq!(iptc.add(keywords, text(TypeId::String, "k2")), ADDED);
        assert_eq!(iptc.len(), 3);
    }

    #[test]
    fn test_iptc_sort_by_record_is_stable() {
        let caption = IptcKey::parse("Iptc.Application2.Caption").unwrap();
        let keywords = IptcKey::parse("Iptc.Application2.Keywords").unwrap();
        let version = IptcKey::parse("Iptc.Envelope.ModelVersion").unwrap();
        let mut iptc = IptcData::new();
        iptc.add(caption, text(TypeId::String, "c"));
        iptc.add(version, text(TypeId::UnsignedShort, "4"));
        iptc.add(keywords, text(TypeId::String, "k"));

        iptc.sort_by_key();
        let keys: Vec<String> = iptc.iter().map(|d| d.key().to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "Iptc.Envelope.ModelVersion",
                "Iptc.Application2.Caption",
                "Iptc.Application2.Keywords"
            ]
        );
    }

    #[test]
    fn test_xmp_store_rejects_invalid() {
        ensure_registry();
        let key = XmpKey::parse("Xmp.dc.format").unwrap();
        let mut xmp = XmpData::new();
        assert_eq!(xmp.add(key.clone(), Value::create(TypeId::Invalid)), REJECTED_INVALID);
        assert_eq!(xmp.add(key.clone(), text(TypeId::XmpText, "image/jpeg")), ADDED);
        assert_eq!(xmp.add(key, text(TypeId::XmpText, "again")), ADDED);
        assert_eq!((&xmp).into_iter().count(), 2);

        xmp.clear();
        assert!(xmp.is_empty());
    }
}
