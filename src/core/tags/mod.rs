//! Tag dictionaries
//!
//! Resolve names to numbers and the expected value type of each key.

pub mod exif;
pub mod iptc;
pub mod xmp;

pub use exif::ExifGroup;
