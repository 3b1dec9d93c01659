//! Metadata core
//!
//! Keys, tag dictionaries, the namespace registry and the in-memory
//! stores for Exif, IPTC and XMP.

pub mod error;
pub mod key;
pub mod metadata;
pub mod namespace;
pub mod tags;

pub use error::{MetaError, MetaResult};
pub use key::{ExifKey, IptcKey, XmpKey};
pub use metadata::{Datum, ExifData, IptcData, XmpData};
pub use namespace::{
    prefix_for_uri, register_namespace, uri_for_prefix, NamespaceMap,
};
pub use tags::ExifGroup;
