//! Validation modules
//!
//! Field catalogue for the loan/KYC form, per-kind sanitizers applied on every
//! write, and the validation rules run on change and before submission.

pub mod fields;
pub mod rules;
pub mod sanitize;

pub use fields::{FieldId, FieldKind, FieldSpec};
pub use rules::{validate_field, FieldError};
pub use sanitize::sanitize;
