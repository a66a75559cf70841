//! Pipeline error taxonomy.
//!
//! Failures with a defined recovery (history fetch, tool execution,
//! persistence) never appear here -- they are absorbed and annotated on the
//! trace. [`PipelineError`] covers only the failures that abort a request.

use thiserror::Error;

/// Errors from the external conversation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("backend response malformed: {0}")]
    Deserialization(String),
}

/// Fatal errors that abort a request.
///
/// Recoverable sub-step failures (degraded history, tool errors, sync
/// failures) are absorbed into the trace and never surface here; the
/// pipeline keeps the distinction between "answer with degraded evidence"
/// and "no answer at all".
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error: the requested persona has no registered
    /// template. Surfaced to the caller as a 4xx-equivalent; never retried.
    #[error("persona not found: '{0}'")]
    PersonaNotFound(String),

    /// The reasoning backend's output failed schema validation twice
    /// (original attempt plus one corrective retry).
    #[error("reasoning output failed schema validation: {0}")]
    ReasoningSchema(String),

    /// The model backend stayed unreachable through bounded retries.
    #[error("model backend unavailable after {attempts} attempts: {last_error}")]
    ModelUnavailable { attempts: u32, last_error: String },

    /// The model requested a second tool-dispatch round; at most one is
    /// allowed per request.
    #[error("tool dispatch round limit exceeded")]
    ToolLoopExceeded,

    /// The caller disconnected; no further reasoning, tools, or sync.
    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether the failure is a caller/configuration problem (4xx-shaped)
    /// rather than a service problem (5xx-shaped).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, PipelineError::PersonaNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Http {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned HTTP 503: maintenance");
    }

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::ModelUnavailable {
            attempts: 3,
            last_error: "request timed out".to_string(),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("request timed out"));
    }

    #[test]
    fn test_caller_error_classification() {
        assert!(PipelineError::PersonaNotFound("x".to_string()).is_caller_error());
        assert!(!PipelineError::ToolLoopExceeded.is_caller_error());
        assert!(!PipelineError::Cancelled.is_caller_error());
    }
}
