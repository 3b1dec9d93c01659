//! Bridge error handling

use crate::core::error::MetaError;
use std::fmt;

/// Error kinds surfaced to callers of the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open, read or write failure
    Basic,
    /// Key string could not be parsed
    InvalidKey,
}

/// Error returned by [`Image`](crate::bridge::Image) and the metadata
/// containers
///
/// The message is the engine's message, carried verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicError {
    kind: ErrorKind,
    message: String,
}

impl BasicError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BasicError {}

impl From<MetaError> for BasicError {
    fn from(err: MetaError) -> Self {
        meta_error_to_basic_error(err)
    }
}

/// Convert an engine error, keeping its message
pub(crate) fn meta_error_to_basic_error(err: MetaError) -> BasicError {
    let kind = match &err {
        MetaError::InvalidKey(_) => ErrorKind::InvalidKey,
        _ => ErrorKind::Basic,
    };
    BasicError {
        kind,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_open_failure_message_is_verbatim() {
        let err = meta_error_to_basic_error(MetaError::UnknownImageType(PathBuf::from(
            "notes.txt",
        )));
        assert_eq!(err.kind(), ErrorKind::Basic);
        assert_eq!(
            err.to_string(),
            "notes.txt: The file contains data of an unknown image type"
        );
    }

    #[test]
    fn test_invalid_key_kind() {
        let err: BasicError = MetaError::InvalidKey("Exif.Nope".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert_eq!(err.message(), "Invalid key: Exif.Nope");
    }
}
