//! Centralized error handling for the prima client.
//!
//! A single error enum covers the failure taxonomy of the client: transport
//! failures that are retryable, validation failures reported by the remote
//! service, and the local precondition failures (missing session, bad
//! configuration). Stale preview responses are not represented here; they
//! are discarded inside the preview executor and never surface as errors.
//!
//! The `From` impls let the `?` operator convert I/O, JSON and HTTP errors
//! automatically:
//!
//! ```no_run
//! use prima::error::Result;
//! use std::fs;
//!
//! fn read_recipe(path: &str) -> Result<String> {
//!     let content = fs::read_to_string(path)?;
//!     Ok(content)
//! }
//! ```

use std::fmt;

/// Main error type for prima operations.
#[derive(Debug)]
pub enum PrimaError {
    /// I/O errors (recipe files, session store, log directory)
    Io(std::io::Error),

    /// Request could not complete (connect, timeout, decode)
    Transport(String),

    /// The remote service rejected the request (HTTP error status)
    Remote { status: u16, detail: String },

    /// No valid session record; the caller must start a new extraction
    SessionMissing,

    /// Configuration errors
    Config(String),

    /// File not found or invalid path
    InvalidPath(String),

    /// JSON encoding/decoding errors
    Json(serde_json::Error),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for PrimaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Transport(msg) => write!(f, "Network error: {msg}"),
            Self::Remote { status, detail } => {
                write!(f, "Remote service error ({status}): {detail}")
            }
            Self::SessionMissing => {
                write!(f, "No active session. Upload a dataset to start one.")
            }
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::InvalidPath(msg) => write!(f, "Invalid path: {msg}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PrimaError {}

impl PrimaError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<std::io::Error> for PrimaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PrimaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<reqwest::Error> for PrimaError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<anyhow::Error> for PrimaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<PrimaError> for String {
    fn from(err: PrimaError) -> Self {
        err.to_string()
    }
}

/// Result type alias for prima operations.
pub type Result<T> = std::result::Result<T, PrimaError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<PrimaError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: PrimaError = e.into();
            PrimaError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: PrimaError = e.into();
            PrimaError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrimaError::Remote {
            status: 422,
            detail: "column 'Cabin' not found".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "Remote service error (422): column 'Cabin' not found"
        );
    }

    #[test]
    fn test_transport_is_retryable() {
        assert!(PrimaError::Transport("connection refused".to_owned()).is_retryable());
        assert!(!PrimaError::SessionMissing.is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "recipe.json",
        ));

        let result: Result<()> = result.context("Failed to read recipe");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read recipe")
        );
    }
}
