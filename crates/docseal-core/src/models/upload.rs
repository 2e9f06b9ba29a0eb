use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ErrorMetadata, SealError};
use crate::validation::FieldError;

/// A file the user picked for sealing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
}

impl SelectedFile {
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            file_name: self.file_name.clone(),
            size: self.size,
            content_type: self.content_type.clone(),
            path: Some(self.path.clone()),
        }
    }
}

/// The part of a selected file that survives in a draft snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Snapshot kept in the local store so a draft survives an interrupted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    #[serde(default)]
    pub file: Option<FileMetadata>,
    /// Metadata JSON text derived from the form at save time
    pub metadata: String,
    pub timestamp: DateTime<Utc>,
}

/// Classified failure shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    /// Internal error text, kept for the support dump
    pub detail: String,
}

impl From<&SealError> for UploadFailure {
    fn from(err: &SealError) -> Self {
        UploadFailure {
            kind: err.error_kind(),
            code: err.error_code().to_string(),
            message: err.client_message(),
            retryable: err.is_retryable(),
            suggested_action: err.suggested_action().map(str::to_string),
            detail: err.to_string(),
        }
    }
}

/// Submission progress and outcome.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadState {
    pub is_uploading: bool,
    /// Heartbeat value, not transfer progress. Reaches 100 only on completion.
    pub progress: u8,
    pub error: Option<UploadFailure>,
    pub validation_errors: Vec<FieldError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failure_from_walacor_error() {
        let err = SealError::Walacor("anchor timeout".to_string());
        let failure = UploadFailure::from(&err);
        assert_eq!(failure.kind, ErrorKind::Walacor);
        assert_eq!(failure.code, "SEALING_ERROR");
        assert!(failure.retryable);
        assert!(failure.detail.contains("anchor timeout"));
    }

    #[test]
    fn test_snapshot_serializes_without_path_when_absent() {
        let snapshot = DraftSnapshot {
            file: Some(FileMetadata {
                file_name: "loan.pdf".to_string(),
                size: 2_097_152,
                content_type: "application/pdf".to_string(),
                path: None,
            }),
            metadata: "{}".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["file"].get("path").is_none());
        assert_eq!(value["file"]["size"], 2_097_152);
    }
}
