//! Error types for contactsync.
//!
//! Library crates use [`ContactSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all contactsync operations.
#[derive(Debug, thiserror::Error)]
pub enum ContactSyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The request could not be sent or its response could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("remote service returned status {status}: {body}")]
    Remote { status: u16, body: String },

    /// The response body was not the shape we expected.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A unique contact attribute is already owned by another contact.
    ///
    /// Only the upsert executor produces this, and it never leaves it.
    #[error("conflict on unique attribute {attribute}: {body}")]
    Conflict { attribute: String, body: String },

    /// Malformed or missing identifiers, or malformed input rows.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Remote state that the pipeline cannot proceed from.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContactSyncError>;

impl ContactSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid-state error from any displayable message.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState {
            message: msg.into(),
        }
    }

    /// Create a remote-status error.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by the error, if the remote service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ContactSyncError::config("missing BREVO_API_KEY");
        assert_eq!(err.to_string(), "config error: missing BREVO_API_KEY");

        let err = ContactSyncError::remote(401, "{\"code\":\"unauthorized\"}");
        assert!(err.to_string().contains("status 401"));
        assert_eq!(err.status(), Some(401));

        let err = ContactSyncError::validation("row 3 has 13 columns, expected 14");
        assert!(err.to_string().contains("row 3"));
        assert_eq!(err.status(), None);
    }
}
