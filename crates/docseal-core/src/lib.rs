//! DocSeal Core Library
//!
//! Domain models, error types, configuration, validation and the
//! upload-and-seal workflow shared by the API client and the CLI.

pub mod config;
pub mod error;
pub mod form;
pub mod hashing;
pub mod models;
pub mod present;
pub mod store;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use config::{AuthScheme, ClientConfig};
pub use error::{ErrorKind, ErrorMetadata, LogLevel, SealError};
pub use form::LoanForm;
pub use hashing::{hash_bytes, hash_file, FileDigest};
pub use present::{ErrorReport, SuccessSummary, VerificationReport};
pub use store::LocalStore;
pub use validation::{FieldError, FieldId};
pub use workflow::{
    check_existing_seal, Action, Effect, Phase, SealingBackend, SealingMachine, SealingSession,
    UploadDraft,
};
