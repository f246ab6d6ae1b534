//! Error types for directory-backed stores.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for store and context operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path backing a key does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The key is not part of a declared set of identifiers.
    #[error("key '{key}' is not one of the valid identifiers {valid:?}")]
    InvalidKey { key: String, valid: Vec<String> },

    /// Bytes on disk could not be decoded as the expected type.
    #[error("failed to decode {}: {message}", path.display())]
    Codec { path: PathBuf, message: String },

    /// The context backend has no implementation for this operation.
    #[error("context backend '{backend}' does not implement {operation}")]
    Unimplemented {
        backend: &'static str,
        operation: &'static str,
    },

    /// Any other I/O failure.
    #[error("I/O error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// A path or key could not be turned into a usable location.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl StoreError {
    /// Returns true if the backing path of a key was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the key was rejected by an allow-set.
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }

    /// Returns true if the stored bytes were corrupt or of the wrong format.
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec { .. })
    }

    /// Returns true if the backend is a placeholder without an implementation.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented { .. })
    }

    /// Map an `std::io::Error` raised at `path`.
    ///
    /// `ErrorKind::NotFound` becomes [`StoreError::NotFound`] so callers can tell
    /// "missing" apart from other failures.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StoreError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub(crate) fn invalid_key<I, S>(key: &str, valid: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut valid: Vec<String> = valid.into_iter().map(Into::into).collect();
        valid.sort();
        StoreError::InvalidKey {
            key: key.to_string(),
            valid,
        }
    }
}

/// Error raised by a [`Codec`](crate::backend::stores::Codec) while encoding or decoding bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid format: {0}")]
    Format(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CodecError {
    /// Attach the path that was being decoded.
    pub fn at(self, path: &Path) -> StoreError {
        StoreError::Codec {
            path: path.to_path_buf(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = StoreError::from_io(err, Path::new("/tmp/x"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_io_other_maps_to_io() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = StoreError::from_io(err, Path::new("/tmp/x"));
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_key_lists_every_valid_id() {
        let err = StoreError::invalid_key("x", ["c", "a", "b"]);
        assert!(err.is_invalid_key());
        let msg = err.to_string();
        assert!(msg.contains("'x'"));
        assert!(msg.contains(r#"["a", "b", "c"]"#), "{msg}");
    }

    #[test]
    fn test_codec_error_carries_path() {
        let err = CodecError::Format("bad magic".into()).at(Path::new("a.npy"));
        assert!(err.is_codec());
        assert!(err.to_string().contains("a.npy"));
        assert!(err.to_string().contains("bad magic"));
    }
}
