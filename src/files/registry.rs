//! Container handler lookup
//!
//! A file is matched on its leading bytes first. The extension is only
//! consulted when no handler recognises the content.

use crate::core::error::{MetaError, MetaResult};
use crate::files::handler::{FileHandler, RawMetadata};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A concrete container handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Handler {
    #[cfg(feature = "jpeg")]
    Jpeg(crate::files::formats::jpeg::JpegHandler),
    #[cfg(feature = "png")]
    Png(crate::files::formats::png::PngHandler),
}

macro_rules! dispatch {
    ($self:ident, $h:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "jpeg")]
            Handler::Jpeg($h) => $call,
            #[cfg(feature = "png")]
            Handler::Png($h) => $call,
        }
    };
}

impl FileHandler for Handler {
    fn can_handle<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<bool> {
        dispatch!(self, h => h.can_handle(reader))
    }

    fn read_metadata<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<RawMetadata> {
        dispatch!(self, h => h.read_metadata(reader))
    }

    fn write_metadata<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        meta: &RawMetadata,
    ) -> MetaResult<()> {
        dispatch!(self, h => h.write_metadata(reader, writer, meta))
    }

    fn format_name(&self) -> &'static str {
        dispatch!(self, h => h.format_name())
    }

    fn extensions(&self) -> &'static [&'static str] {
        dispatch!(self, h => h.extensions())
    }
}

/// Ordered set of container handlers
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler; earlier handlers win ties
    pub fn register(&mut self, handler: Handler) {
        if !self.handlers.contains(&handler) {
            self.handlers.push(handler);
        }
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub fn format_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.format_name()).collect()
    }

    /// Match a lowercase or uppercase extension, without the dot
    pub fn find_by_extension(&self, extension: &str) -> Option<Handler> {
        let extension = extension.to_ascii_lowercase();
        self.handlers
            .iter()
            .copied()
            .find(|h| h.extensions().contains(&extension.as_str()))
    }

    /// Try each handler against the stream
    ///
    /// The stream is rewound to where it started, whatever the outcome.
    pub fn find_by_detection<R: Read + Seek>(&self, reader: &mut R) -> MetaResult<Option<Handler>> {
        let start = reader.stream_position()?;
        let mut found = None;
        for handler in &self.handlers {
            reader.seek(SeekFrom::Start(start))?;
            if handler.can_handle(reader)? {
                found = Some(*handler);
                break;
            }
        }
        reader.seek(SeekFrom::Start(start))?;
        Ok(found)
    }

    /// Pick the handler for a file whose contents are already loaded
    ///
    /// # Errors
    ///
    /// [`MetaError::UnknownImageType`] when neither the content nor the
    /// extension identifies a handler.
    pub fn resolve(&self, path: &Path, data: &[u8]) -> MetaResult<Handler> {
        if let Some(handler) = self.find_by_detection(&mut Cursor::new(data))? {
            return Ok(handler);
        }
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.find_by_extension(ext));
        match by_extension {
            Some(handler) => {
                log::debug!(
                    "{}: content not recognised, using {} by extension",
                    path.display(),
                    handler.format_name()
                );
                Ok(handler)
            }
            None => Err(MetaError::UnknownImageType(path.to_path_buf())),
        }
    }
}

/// Registry holding every handler enabled at build time
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    #[cfg(feature = "jpeg")]
    registry.register(Handler::Jpeg(crate::files::formats::jpeg::JpegHandler));
    #[cfg(feature = "png")]
    registry.register(Handler::Png(crate::files::formats::png::PngHandler));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNKNOWN: &[u8] = &[0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];

    #[test]
    fn test_register_ignores_duplicates() {
        let mut registry = default_registry();
        let count = registry.handlers().len();
        let first = registry.handlers()[0];
        registry.register(first);
        assert_eq!(registry.handlers().len(), count);
    }

    #[cfg(all(feature = "jpeg", feature = "png"))]
    #[test]
    fn test_format_names_in_registration_order() {
        assert_eq!(default_registry().format_names(), vec!["JPEG", "PNG"]);
    }

    #[test]
    fn test_find_by_extension() {
        let registry = default_registry();

        #[cfg(feature = "jpeg")]
        {
            assert!(registry.find_by_extension("jpg").is_some());
            assert!(registry.find_by_extension("JPEG").is_some());
        }

        #[cfg(feature = "png")]
        assert!(registry.find_by_extension("png").is_some());

        assert!(registry.find_by_extension("tiff").is_none());
        assert!(HandlerRegistry::new().find_by_extension("jpg").is_none());
    }

    #[cfg(feature = "png")]
    #[test]
    fn test_resolve_prefers_content() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let handler = default_registry()
            .resolve(Path::new("misnamed.jpg"), &png)
            .unwrap();
        assert_eq!(handler.format_name(), "PNG");
    }

    #[cfg(feature = "jpeg")]
    #[test]
    fn test_resolve_falls_back_to_extension() {
        let handler = default_registry()
            .resolve(Path::new("truncated.JPG"), UNKNOWN)
            .unwrap();
        assert_eq!(handler.format_name(), "JPEG");
    }

    #[test]
    fn test_resolve_unknown() {
        let err = default_registry()
            .resolve(Path::new("notes.txt"), UNKNOWN)
            .unwrap_err();
        assert!(matches!(err, MetaError::UnknownImageType(_)));
    }

    #[test]
    fn test_detection_rewinds() {
        let mut reader = Cursor::new(UNKNOWN.to_vec());
        reader.set_position(3);
        let handler = default_registry().find_by_detection(&mut reader).unwrap();
        assert!(handler.is_none());
        assert_eq!(reader.position(), 3);
    }
}
