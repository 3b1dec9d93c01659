//! File format handlers
//!
//! Each format handler knows where its container keeps the Exif, IPTC and
//! XMP blocks, and how to swap them without touching anything else.

#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png")]
pub mod png;
