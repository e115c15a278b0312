//! Error taxonomy for the boundary layer.
//!
//! Three categories cross this boundary:
//! - boundary errors: invalid handles, malformed option payloads, null or
//!   invalid bridge references
//! - I/O bridge errors: negative-sentinel returns from read/write/seek,
//!   surfaced verbatim as operation failure
//! - engine errors: whatever the underlying session reports, passed through
//!   as text so no diagnostic detail is lost
//!
//! Every error terminates the current operation; nothing is retried here.

use thiserror::Error;

/// Error type for all boundary-layer operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("invalid session handle {0}")]
    InvalidHandle(i64),

    #[error("null pointer argument: {0}")]
    NullArgument(&'static str),

    #[error("invalid UTF-8 in argument: {0}")]
    InvalidUtf8(&'static str),

    #[error("malformed option payload: {0}")]
    InvalidOptions(String),

    #[error("stream source read failed (status {0})")]
    SourceRead(i64),

    #[error("stream source seek failed (status {0})")]
    SourceSeek(i64),

    #[error("stream source is not seekable")]
    SourceNotSeekable,

    #[error("stream sink write failed (status {0})")]
    SinkWrite(i64),

    #[error("payload exceeds maximum size")]
    PayloadTooLarge,

    #[error("unsupported store url: {0}")]
    UnsupportedStore(String),

    #[error("zone not found: {0}")]
    ZoneNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("zone already exists: {0}")]
    ZoneExists(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("payload serialization failed: {0}")]
    Serialization(String),

    #[error("internal panic in {0}")]
    Internal(&'static str),
}

impl BridgeError {
    /// Wrap an I/O failure from a host filesystem or backend as an engine
    /// error, keeping the original description intact.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        BridgeError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_descriptive() {
        assert_eq!(
            BridgeError::InvalidHandle(42).to_string(),
            "invalid session handle 42"
        );
        assert_eq!(
            BridgeError::SourceRead(-1).to_string(),
            "stream source read failed (status -1)"
        );
        assert_eq!(
            BridgeError::ZoneNotFound("docs".into()).to_string(),
            "zone not found: docs"
        );
    }

    #[test]
    fn test_backend_wrapping_preserves_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = BridgeError::backend(io);
        assert!(err.to_string().contains("denied"));
    }
}
