//! Metadata codecs
//!
//! Convert between the in-memory stores and the byte layouts embedded in
//! image files.

pub mod exif;
pub mod iptc;
pub mod xmp;

pub use exif::ByteOrder;
