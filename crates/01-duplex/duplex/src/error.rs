//! Error surface shared by both sides of a duplex stream.
//!
//! Errors are `Clone` because a single terminal cause is handed to every
//! waiter: pending readiness checks, later writes, and the reader.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result alias for fallible stream operations.
pub type StreamResult<T, E = StreamError> = Result<T, E>;

/// Default message used when a stream is aborted without an explicit reason.
pub const DEFAULT_ABORT_REASON: &str = "Stream writer aborted.";

#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// The stream was aborted; carries the abort reason and classification.
    #[error(transparent)]
    Aborted(#[from] AbortError),

    #[error("stream closed")]
    Closed,

    #[error("writer lock released")]
    Released,

    #[error("writable side is already locked to a writer")]
    Locked,

    #[error("readable side canceled")]
    Canceled,

    /// Raised by the transformer; the original error is kept intact.
    #[error("transform failed: {0}")]
    Transform(Arc<anyhow::Error>),
}

impl StreamError {
    pub fn transform(err: anyhow::Error) -> Self {
        StreamError::Transform(Arc::new(err))
    }

    /// Returns the abort cause when this error stems from an abort.
    pub fn as_aborted(&self) -> Option<&AbortError> {
        match self {
            StreamError::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

/// Classification attached to an [`AbortError`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unknown,
    #[default]
    Abort,
    Expired,
    Empty,
    WrongValue,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "unknown",
            ErrorCode::Abort => "abort",
            ErrorCode::Expired => "expired",
            ErrorCode::Empty => "empty",
            ErrorCode::WrongValue => "wrong_value",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured abort cause delivered to every writer operation after an abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AbortError {
    message: String,
    code: ErrorCode,
    cause: Option<String>,
}

impl AbortError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ErrorCode::Abort,
            cause: None,
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl Default for AbortError {
    fn default() -> Self {
        Self::new(DEFAULT_ABORT_REASON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_error_defaults_to_abort_code() {
        let err = AbortError::default();
        assert_eq!(err.message(), DEFAULT_ABORT_REASON);
        assert_eq!(err.code(), ErrorCode::Abort);
        assert_eq!(err.cause(), None);
        assert_eq!(err.to_string(), DEFAULT_ABORT_REASON);
    }

    #[test]
    fn aborted_stream_error_displays_reason() {
        let err: StreamError = AbortError::new("deadline hit")
            .with_code(ErrorCode::Expired)
            .into();
        assert_eq!(err.to_string(), "deadline hit");
        let abort = err.as_aborted().expect("abort cause");
        assert_eq!(abort.code(), ErrorCode::Expired);
        assert!(StreamError::Closed.as_aborted().is_none());
    }

    #[test]
    fn transform_error_keeps_source_message() {
        let err = StreamError::transform(anyhow::anyhow!("bad chunk"));
        assert_eq!(err.to_string(), "transform failed: bad chunk");
    }

    #[test]
    fn error_code_uses_snake_case_names() {
        let json = serde_json::to_string(&ErrorCode::WrongValue).expect("serialize");
        assert_eq!(json, "\"wrong_value\"");
        let code: ErrorCode = serde_json::from_str("\"expired\"").expect("deserialize");
        assert_eq!(code, ErrorCode::Expired);
        assert_eq!(ErrorCode::Expired.to_string(), "expired");
    }
}
