//! Error types module
//!
//! All failures of the sealing workflow are unified under the `SealError` enum.
//! Each variant maps to one of five error kinds (validation, network, server,
//! walacor, unknown) which decide whether a retry is offered to the user.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

use serde::{Deserialize, Serialize};

use crate::validation::FieldError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like network hiccups
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Error taxonomy shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Network,
    Server,
    Walacor,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Walacor => "walacor",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for error presentation - defines how an error should be shown
/// This trait allows errors to self-describe their kind and retry behaviour
pub trait ErrorMetadata {
    /// Taxonomy bucket for this error
    fn error_kind(&self) -> ErrorKind;

    /// Machine-readable error code (e.g., "NETWORK_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether a retry action should be offered
    fn is_retryable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SealError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Failed to calculate file hash: {0}")]
    Hashing(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Sealing failed: {0}")]
    Walacor(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Document already sealed as artifact {0}")]
    AlreadySealed(String),

    #[error("Local store error: {0}")]
    Storage(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl SealError {
    /// Classify a non-success HTTP response.
    ///
    /// Messages that mention the ledger win over the status code, since the
    /// backend reports ledger failures as plain 500s.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        let lowered = message.to_lowercase();
        if lowered.contains("walacor") || lowered.contains("blockchain") {
            return SealError::Walacor(message);
        }
        match status {
            500..=599 => SealError::Server { status, message },
            400 | 422 => SealError::InvalidInput(message),
            _ => SealError::Rejected { status, message },
        }
    }

    /// Log at the level the error's metadata asks for.
    pub fn log(&self, context: &str) {
        let code = self.error_code();
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(code, error = %self, "{}", context),
            LogLevel::Warn => tracing::warn!(code, error = %self, "{}", context),
            LogLevel::Error => tracing::error!(code, error = %self, "{}", context),
        }
    }

    /// Field errors carried by a validation failure, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            SealError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Pull a human-readable message out of a FastAPI-style or generic JSON error
/// body, falling back to the raw text.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(other) if !other.is_null() && !other.is_string() => {
                    return other.to_string();
                }
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}

impl From<io::Error> for SealError {
    fn from(err: io::Error) -> Self {
        SealError::Hashing(err.to_string())
    }
}

impl From<serde_json::Error> for SealError {
    fn from(err: serde_json::Error) -> Self {
        SealError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (kind, error_code, retryable, suggested_action, log_level).
/// client_message stays per-variant for dynamic content.
fn seal_error_static_metadata(
    err: &SealError,
) -> (ErrorKind, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        SealError::Validation(_) => (
            ErrorKind::Validation,
            "VALIDATION_ERROR",
            false,
            Some("Fix the highlighted fields and submit again"),
            LogLevel::Debug,
        ),
        SealError::InvalidInput(_) => (
            ErrorKind::Validation,
            "INVALID_INPUT",
            false,
            Some("Check the submitted values and try again"),
            LogLevel::Debug,
        ),
        SealError::FileTooLarge { .. } => (
            ErrorKind::Validation,
            "FILE_TOO_LARGE",
            false,
            Some("Select a smaller file"),
            LogLevel::Debug,
        ),
        SealError::AlreadySealed(_) => (
            ErrorKind::Validation,
            "ALREADY_SEALED",
            false,
            Some("Verify the existing seal instead of sealing again"),
            LogLevel::Debug,
        ),
        SealError::Hashing(_) => (
            ErrorKind::Unknown,
            "HASH_ERROR",
            true,
            Some("Check that the file is readable and select it again"),
            LogLevel::Warn,
        ),
        SealError::Network(_) => (
            ErrorKind::Network,
            "NETWORK_ERROR",
            true,
            Some("Check your connection and retry"),
            LogLevel::Warn,
        ),
        SealError::Server { .. } => (
            ErrorKind::Server,
            "SERVER_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        SealError::Walacor(_) => (
            ErrorKind::Walacor,
            "SEALING_ERROR",
            true,
            Some("Your input is saved locally; retry sealing shortly"),
            LogLevel::Error,
        ),
        SealError::Rejected { status, .. } => (
            ErrorKind::Unknown,
            "REQUEST_REJECTED",
            matches!(status, 408 | 429),
            Some("Check credentials and request parameters"),
            LogLevel::Warn,
        ),
        SealError::Storage(_) => (
            ErrorKind::Unknown,
            "LOCAL_STORE_ERROR",
            true,
            Some("Check that the state directory is writable"),
            LogLevel::Warn,
        ),
        SealError::Unknown(_) => (
            ErrorKind::Unknown,
            "UNKNOWN_ERROR",
            true,
            Some("Retry, and contact support if this error persists"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for SealError {
    fn error_kind(&self) -> ErrorKind {
        seal_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        seal_error_static_metadata(self).1
    }

    fn is_retryable(&self) -> bool {
        seal_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        seal_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        seal_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            SealError::Validation(errors) => {
                format!("Please fix {} invalid field(s) before sealing", errors.len())
            }
            SealError::InvalidInput(ref msg) => msg.clone(),
            SealError::FileTooLarge { size, limit } => format!(
                "File is {} bytes; the maximum allowed size is {} bytes",
                size, limit
            ),
            SealError::Hashing(_) => "Failed to calculate file hash".to_string(),
            SealError::Network(_) => {
                "Unable to reach the sealing service. Check your connection.".to_string()
            }
            SealError::Server { .. } => "The sealing service encountered an error".to_string(),
            SealError::Walacor(_) => {
                "The document could not be sealed on the ledger. It is saved locally pending seal."
                    .to_string()
            }
            SealError::Rejected { ref message, .. } => message.clone(),
            SealError::AlreadySealed(ref id) => {
                format!("This document is already sealed (artifact {})", id)
            }
            SealError::Storage(_) => "Failed to access the local draft store".to_string(),
            SealError::Unknown(_) => "An unexpected error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldId;

    #[test]
    fn test_error_metadata_validation() {
        let err = SealError::Validation(vec![FieldError::new(
            FieldId::LoanId,
            "Loan ID is required",
        )]);
        assert_eq!(err.error_kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_retryable());
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_network() {
        let err = SealError::Network("connection refused".to_string());
        assert_eq!(err.error_kind(), ErrorKind::Network);
        assert!(err.is_retryable());
        assert!(!err.client_message().contains("refused"));
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_from_response_server() {
        let err = SealError::from_response(503, r#"{"detail":"maintenance"}"#);
        assert_eq!(
            err,
            SealError::Server {
                status: 503,
                message: "maintenance".to_string()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_response_walacor_wins_over_status() {
        let err = SealError::from_response(500, r#"{"detail":"Walacor service unavailable"}"#);
        assert_eq!(err.error_kind(), ErrorKind::Walacor);
        assert!(err.is_retryable());

        let err = SealError::from_response(400, "blockchain anchor rejected");
        assert_eq!(err.error_kind(), ErrorKind::Walacor);
    }

    #[test]
    fn test_from_response_client_errors() {
        let err = SealError::from_response(422, r#"{"detail":[{"loc":["body","loan_id"]}]}"#);
        assert_eq!(err.error_kind(), ErrorKind::Validation);
        assert!(!err.is_retryable());

        let err = SealError::from_response(401, "");
        assert_eq!(err.error_kind(), ErrorKind::Unknown);
        assert!(!err.is_retryable());
        assert_eq!(err.client_message(), "Unknown error");

        let err = SealError::from_response(429, "slow down");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::Walacor.to_string(), "walacor");
        assert_eq!(
            serde_json::to_value(ErrorKind::Validation).unwrap(),
            serde_json::json!("validation")
        );
    }
}
