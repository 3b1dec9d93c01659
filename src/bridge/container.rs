//! Metadata containers
//!
//! [`ExifData`], [`IptcData`] and [`XmpData`] are live views into one store
//! of an [`Image`]. Each holds a clone of the image handle, so a container
//! stays usable after the caller drops its `Image`.
//!
//! Insertion differs per family: Exif never rejects an entry, while the
//! IPTC and XMP stores can refuse one and report it as `Ok(false)`.

use std::collections::BTreeMap;
use std::fmt;

use crate::bridge::error::{meta_error_to_basic_error, BasicError};
use crate::bridge::image::Image;
use crate::bridge::value::{decode, NativeValue};
use crate::core::key::{ExifKey, IptcKey, XmpKey};
use crate::core::metadata::ADDED;
use crate::types::{TypeId, Value};

/// Operations shared by the three metadata containers
pub trait MetadataContainer {
    /// Enumerate `(key, value)` pairs in store order
    ///
    /// Every call starts again from the first entry. Adding or deleting
    /// entries while an [`Entries`] iterator is alive is the caller's
    /// responsibility: the iterator walks the live store by index and may
    /// skip or repeat entries.
    fn each(&self) -> Entries;

    /// Insert entries for `key` read from `values`
    fn add_values(&self, key: &str, values: &[&str]) -> Result<bool, BasicError>;

    /// Remove the first entry with this key
    fn delete(&self, key: &str) -> Result<bool, BasicError>;

    /// Remove every entry with this key, returning how many were removed
    fn delete_all(&self, key: &str) -> Result<usize, BasicError>;

    /// The first entry with this key, decoded
    fn get(&self, key: &str) -> Result<NativeValue, BasicError>;

    fn len(&self) -> usize;

    /// Insert one entry for `key`, read from `value`
    fn add(&self, key: &str, value: &str) -> Result<bool, BasicError> {
        self.add_values(key, &[value])
    }

    /// Replace all entries for `key`
    fn set(&self, key: &str, values: &[&str]) -> Result<bool, BasicError> {
        self.delete_all(key)?;
        self.add_values(key, values)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries keyed by their canonical key
    ///
    /// Values of a repeated key are gathered into an array in store order.
    fn to_hash(&self) -> BTreeMap<String, NativeValue> {
        let mut hash = BTreeMap::new();
        for (key, value) in self.each() {
            match hash.remove(&key) {
                None => {
                    hash.insert(key, value);
                }
                Some(NativeValue::Array(mut items)) => {
                    items.push(value);
                    hash.insert(key, NativeValue::Array(items));
                }
                Some(previous) => {
                    hash.insert(key, NativeValue::Array(vec![previous, value]));
                }
            }
        }
        hash
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Exif,
    Iptc,
    Xmp,
}

/// Iterator over the decoded entries of a container
///
/// Each step borrows the image only while reading the current entry.
pub struct Entries {
    image: Image,
    family: Family,
    index: usize,
}

impl Iterator for Entries {
    type Item = (String, NativeValue);

    fn next(&mut self) -> Option<Self::Item> {
        let options = self.image.options();
        let file = self.image.file().borrow();
        let entry = match self.family {
            Family::Exif => file
                .exif_data()
                .get(self.index)
                .map(|d| (d.key().to_string(), decode(d.value(), &options))),
            Family::Iptc => file
                .iptc_data()
                .get(self.index)
                .map(|d| (d.key().to_string(), decode(d.value(), &options))),
            Family::Xmp => file
                .xmp_data()
                .get(self.index)
                .map(|d| (d.key().to_string(), decode(d.value(), &options))),
        };
        if entry.is_some() {
            self.index += 1;
        }
        entry
    }
}

/// Create a value of `type_id` and read each of `texts` into it
fn read_value(type_id: TypeId, texts: &[&str]) -> Value {
    let mut value = Value::create(type_id);
    for text in texts {
        if let Err(e) = value.read(text) {
            log::debug!("Cannot read {:?} as {}: {}", text, type_id, e);
        }
    }
    value
}

/// Inherent plumbing shared by the three containers
macro_rules! impl_container {
    ($name:ident, $family:expr, $key:ty, $store:ident, $store_mut:ident) => {
        impl $name {
            pub(crate) fn new(image: Image) -> Self {
                Self { image }
            }

            /// The image this container belongs to
            pub fn image(&self) -> &Image {
                &self.image
            }

            fn parse_key(key: &str) -> Result<$key, BasicError> {
                <$key>::parse(key).map_err(meta_error_to_basic_error)
            }

            fn entries(&self) -> Entries {
                Entries {
                    image: self.image.clone(),
                    family: $family,
                    index: 0,
                }
            }

            fn count(&self) -> usize {
                self.image.file().borrow().$store().len()
            }

            fn insert(&self, key: $key, value: Value) -> bool {
                self.image.file().borrow_mut().$store_mut().add(key, value) == ADDED
            }

            fn remove_first(&self, key: &$key) -> bool {
                let mut file = self.image.file().borrow_mut();
                let store = file.$store_mut();
                store
                    .find_key(key)
                    .and_then(|index| store.erase(index))
                    .is_some()
            }

            fn remove_all(&self, key: &$key) -> usize {
                let mut removed = 0;
                while self.remove_first(key) {
                    removed += 1;
                }
                removed
            }

            fn first_value(&self, key: &$key) -> Option<NativeValue> {
                let options = self.image.options();
                let file = self.image.file().borrow();
                let store = file.$store();
                store
                    .find_key(key)
                    .and_then(|index| store.get(index))
                    .map(|d| decode(d.value(), &options))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    "#<{}: {}>",
                    stringify!($name),
                    NativeValue::Hash(self.to_hash())
                )
            }
        }

        impl IntoIterator for &$name {
            type Item = (String, NativeValue);
            type IntoIter = Entries;

            fn into_iter(self) -> Entries {
                self.each()
            }
        }
    };
}

/// Exif entries of an image
#[derive(Clone)]
pub struct ExifData {
    image: Image,
}

impl_container!(ExifData, Family::Exif, ExifKey, exif_data, exif_data_mut);

impl MetadataContainer for ExifData {
    fn each(&self) -> Entries {
        self.entries()
    }

    /// One entry per element; elements that fail to parse are skipped and
    /// the result is always `true`
    fn add_values(&self, key: &str, values: &[&str]) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        let type_id = key.default_type_id();
        for text in values {
            let value = read_value(type_id, &[text]);
            if value.ok() {
                self.insert(key, value);
            }
        }
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_first(&key))
    }

    fn delete_all(&self, key: &str) -> Result<usize, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_all(&key))
    }

    /// `Bool(false)` when the key is absent
    fn get(&self, key: &str) -> Result<NativeValue, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.first_value(&key).unwrap_or(NativeValue::Bool(false)))
    }

    fn len(&self) -> usize {
        self.count()
    }
}

/// IPTC datasets of an image
#[derive(Clone)]
pub struct IptcData {
    image: Image,
}

impl_container!(IptcData, Family::Iptc, IptcKey, iptc_data, iptc_data_mut);

impl MetadataContainer for IptcData {
    fn each(&self) -> Entries {
        self.entries()
    }

    /// A repeatable dataset gets one entry per element and always reports
    /// `true`. A non-repeatable dataset reads every element into a single
    /// value and reports whether the store accepted it.
    fn add_values(&self, key: &str, values: &[&str]) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        let type_id = key.type_id();

        if key.is_repeatable() {
            for text in values {
                let value = read_value(type_id, &[text]);
                if value.ok() {
                    self.insert(key, value);
                }
            }
            return Ok(true);
        }

        let value = read_value(type_id, values);
        Ok(value.ok() && self.insert(key, value))
    }

    fn delete(&self, key: &str) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_first(&key))
    }

    fn delete_all(&self, key: &str) -> Result<usize, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_all(&key))
    }

    /// Repeatable datasets always decode to an array, empty when absent;
    /// an absent non-repeatable dataset is `Nil`
    fn get(&self, key: &str) -> Result<NativeValue, BasicError> {
        let key = Self::parse_key(key)?;
        let repeatable = key.is_repeatable();
        Ok(match self.first_value(&key) {
            Some(array @ NativeValue::Array(_)) => array,
            Some(value) if repeatable => NativeValue::Array(vec![value]),
            Some(value) => value,
            None if repeatable => NativeValue::Array(Vec::new()),
            None => NativeValue::Nil,
        })
    }

    fn len(&self) -> usize {
        self.count()
    }
}

/// XMP properties of an image
#[derive(Clone)]
pub struct XmpData {
    image: Image,
}

impl_container!(XmpData, Family::Xmp, XmpKey, xmp_data, xmp_data_mut);

impl MetadataContainer for XmpData {
    fn each(&self) -> Entries {
        self.entries()
    }

    /// All elements are read into one value: arrays and language
    /// alternatives accumulate them, other types keep the last one
    fn add_values(&self, key: &str, values: &[&str]) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        let value = read_value(key.type_id(), values);
        Ok(value.ok() && self.insert(key, value))
    }

    fn delete(&self, key: &str) -> Result<bool, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_first(&key))
    }

    fn delete_all(&self, key: &str) -> Result<usize, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(self.remove_all(&key))
    }

    /// An absent Bag or Seq property is an empty array, anything else `Nil`
    fn get(&self, key: &str) -> Result<NativeValue, BasicError> {
        let key = Self::parse_key(key)?;
        Ok(match self.first_value(&key) {
            Some(value) => value,
            None if matches!(key.type_id(), TypeId::XmpBag | TypeId::XmpSeq) => {
                NativeValue::Array(Vec::new())
            }
            None => NativeValue::Nil,
        })
    }

    fn len(&self) -> usize {
        self.count()
    }
}
