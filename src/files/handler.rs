//! File handler trait
//!
//! Every container format implements [`FileHandler`]. Handlers only move
//! raw metadata blocks in and out of the file; decoding and encoding the
//! blocks is left to the codecs.

use crate::core::error::MetaResult;
use std::io::{Read, Seek, Write};

/// Raw metadata blocks of a file
///
/// `None` means the block is absent. On write, an empty block removes the
/// corresponding segment or chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    /// TIFF structure, without any container prefix
    pub exif: Option<Vec<u8>>,
    /// Photoshop image resource block, including the `Photoshop 3.0` header
    pub iptc: Option<Vec<u8>>,
    /// XMP packet
    pub xmp: Option<String>,
}

impl RawMetadata {
    pub fn is_empty(&self) -> bool {
        self.exif.is_none() && self.iptc.is_none() && self.xmp.is_none()
    }
}

/// Trait for file format handlers
///
/// All file format handlers (JPEG, PNG) implement this trait to provide a
/// unified interface for reading and writing metadata blocks.
pub trait FileHandler: Send + Sync {
    /// Check if this handler can handle the given file
    ///
    /// This method peeks at the file header. It should not consume the
    /// reader.
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<bool>;

    /// Read the raw metadata blocks from a file
    ///
    /// # Returns
    ///
    /// * `Ok(RawMetadata)` with each block that was found
    /// * `Err(MetaError)` if the container structure is corrupt
    fn read_metadata<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<RawMetadata>;

    /// Copy `reader` to `writer`, replacing the metadata blocks
    ///
    /// # Arguments
    ///
    /// * `reader` - The source file
    /// * `writer` - The output file
    /// * `meta` - The blocks to write; absent or empty blocks are dropped
    fn write_metadata<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()>;

    /// Get the name of the file format this handler supports
    fn format_name(&self) -> &'static str;

    /// Get the file extensions this handler supports
    ///
    /// A slice of file extensions (e.g., &["jpg", "jpeg"] for JPEG)
    fn extensions(&self) -> &'static [&'static str];
}
