//! Error types for metadata operations
//!
//! This module defines all error types used by the metadata engine.

use std::path::PathBuf;

use thiserror::Error;

/// Error types for metadata operations
#[derive(Debug, Error)]
pub enum MetaError {
    /// Bad parameter provided to a function
    #[error("Bad parameter: {0}")]
    BadParam(String),

    /// Text could not be read into a value of the expected type
    #[error("Bad value: {0}")]
    BadValue(String),

    /// Malformed Exif, IPTC or XMP key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Parse error (XML/RDF parsing failed)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Binary metadata structure is inconsistent
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The image file could not be opened
    #[error("{}: Failed to open the data source: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// No registered handler recognises the file
    #[error("{}: The file contains data of an unknown image type", .0.display())]
    UnknownImageType(PathBuf),

    /// Operation not supported
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for metadata operations
pub type MetaResult<T> = Result<T, MetaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetaError::InvalidKey("Exif.Nope".to_string());
        assert_eq!(err.to_string(), "Invalid key: Exif.Nope");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MetaError = io_err.into();
        assert!(matches!(err, MetaError::IoError(_)));
    }

    #[test]
    fn test_open_failed_message() {
        let err = MetaError::OpenFailed {
            path: PathBuf::from("tmp/no-such-file.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(
            err.to_string(),
            "tmp/no-such-file.jpg: Failed to open the data source: No such file"
        );
    }
}
