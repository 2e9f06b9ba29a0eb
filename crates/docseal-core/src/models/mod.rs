//! Data models for the sealing client
//!
//! Request/response shapes of the sealing API plus the transient view-model
//! objects of the upload workflow.

mod loan_document;
mod seal;
mod upload;
mod verify;

// Re-export all models for convenient imports
pub use loan_document::*;
pub use seal::*;
pub use upload::*;
pub use verify::*;
