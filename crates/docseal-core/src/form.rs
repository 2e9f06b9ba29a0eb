//! Loan/KYC form store.
//!
//! The structured field map is the only source of truth. The metadata JSON
//! shown in the raw editor is computed from it, and edits made in the raw
//! editor are parsed and written back through the same sanitizers.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::SealError;
use crate::models::{AddressPayload, BorrowerPayload, SealRequest, SelectedFile};
use crate::validation::{sanitize, validate_field, FieldError, FieldId};

const DEFAULT_COUNTRY: &str = "US";

#[derive(Debug, Clone, PartialEq)]
pub struct LoanForm {
    values: BTreeMap<FieldId, String>,
    /// Metadata keys without a dedicated field
    extra: Map<String, Value>,
}

impl Default for LoanForm {
    fn default() -> Self {
        let mut form = LoanForm {
            values: BTreeMap::new(),
            extra: Map::new(),
        };
        form.values
            .insert(FieldId::BorrowerCountry, DEFAULT_COUNTRY.to_string());
        form
    }
}

impl LoanForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: FieldId) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Sanitize and store a raw value. Returns the inline validation error, if any.
    pub fn set(&mut self, field: FieldId, raw: &str) -> Option<FieldError> {
        let value = sanitize(field.kind(), raw);
        let error = validate_field(field, &value);
        if value.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, value);
        }
        error
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// True when nothing beyond the defaults has been entered.
    pub fn is_pristine(&self) -> bool {
        *self == LoanForm::default()
    }

    /// Run every field's validator.
    pub fn validate(&self) -> Vec<FieldError> {
        FieldId::ALL
            .iter()
            .filter_map(|field| validate_field(*field, self.get(*field)))
            .collect()
    }

    /// Derived metadata view: every non-empty field plus the extra entries.
    pub fn metadata_json(&self) -> Value {
        let mut map = self.extra.clone();
        for (field, value) in &self.values {
            map.insert(field.key().to_string(), Value::String(value.clone()));
        }
        Value::Object(map)
    }

    pub fn metadata_text(&self) -> String {
        serde_json::to_string_pretty(&self.metadata_json()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the form contents from edited metadata JSON text.
    ///
    /// Known keys go through their sanitizers, keys that are absent are
    /// cleared, unknown keys become extra entries. On error the form is left
    /// unchanged. Returns the inline errors of the new values.
    pub fn apply_metadata_text(&mut self, text: &str) -> Result<Vec<FieldError>, SealError> {
        let parsed: Value = serde_json::from_str(text)?;
        let Value::Object(object) = parsed else {
            return Err(SealError::InvalidInput(
                "Metadata must be a JSON object".to_string(),
            ));
        };

        let mut next = LoanForm {
            values: BTreeMap::new(),
            extra: Map::new(),
        };
        let mut errors = Vec::new();
        for (key, value) in object {
            match FieldId::from_key(&key) {
                Some(field) => {
                    let raw = value_to_raw(&value).map_err(|_| {
                        SealError::InvalidInput(format!("Field {} must be a scalar value", key))
                    })?;
                    if let Some(err) = next.set(field, &raw) {
                        errors.push(err);
                    }
                }
                None => {
                    next.extra.insert(key, value);
                }
            }
        }

        *self = next;
        Ok(errors)
    }

    /// Merge values from an imported JSON document.
    ///
    /// Accepts the flat metadata shape or the nested seal-request shape
    /// (`borrower`, `borrower.address`, optional `loan`). Only fields present
    /// in the document are touched. Returns the fields that were written.
    pub fn populate_from_json(&mut self, document: &Value) -> Vec<FieldId> {
        let mut written = Vec::new();
        let Some(root) = document.as_object() else {
            return written;
        };

        let mut write = |form: &mut LoanForm, field: FieldId, value: &Value| {
            if let Ok(raw) = value_to_raw(value) {
                form.set(field, &raw);
                written.push(field);
            }
        };

        for (key, value) in root {
            if let Some(field) = FieldId::from_key(key) {
                write(self, field, value);
            }
        }

        if let Some(loan) = root.get("loan").and_then(Value::as_object) {
            for (key, value) in loan {
                if let Some(field) = FieldId::from_key(key) {
                    write(self, field, value);
                }
            }
        }

        if let Some(borrower) = root.get("borrower").and_then(Value::as_object) {
            for (key, value) in borrower {
                if key == "address" {
                    if let Some(address) = value.as_object() {
                        for (part, part_value) in address {
                            if let Some(field) = borrower_field(part) {
                                write(self, field, part_value);
                            }
                        }
                    }
                } else if let Some(field) = borrower_field(key) {
                    write(self, field, value);
                }
            }
        }

        written
    }

    /// Build the seal request body. Fails with the full list of field errors.
    pub fn to_seal_request(
        &self,
        file: &SelectedFile,
        document_hash: &str,
        etid: u32,
    ) -> Result<SealRequest, SealError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SealError::Validation(errors));
        }

        let optional = |field: FieldId| {
            let value = self.get(field);
            (!value.is_empty()).then(|| value.to_string())
        };
        let required = |field: FieldId| self.get(field).to_string();

        Ok(SealRequest {
            loan_id: required(FieldId::LoanId),
            document_type: required(FieldId::DocumentType),
            loan_amount: parse_decimal(FieldId::LoanAmount, self.get(FieldId::LoanAmount))?,
            interest_rate: optional(FieldId::InterestRate)
                .map(|v| parse_decimal(FieldId::InterestRate, &v))
                .transpose()?,
            loan_term_months: optional(FieldId::LoanTermMonths)
                .map(|v| {
                    v.parse::<u32>().map_err(|_| {
                        SealError::InvalidInput("Loan term must be a whole number".to_string())
                    })
                })
                .transpose()?,
            property_address: optional(FieldId::PropertyAddress),
            additional_notes: optional(FieldId::AdditionalNotes),
            created_by: required(FieldId::CreatedBy),
            document_hash: document_hash.to_string(),
            file_name: file.file_name.clone(),
            file_size: file.size,
            content_type: file.content_type.clone(),
            etid,
            borrower: BorrowerPayload {
                full_name: required(FieldId::BorrowerFullName),
                date_of_birth: required(FieldId::BorrowerDateOfBirth),
                email: required(FieldId::BorrowerEmail),
                phone: required(FieldId::BorrowerPhone),
                address: AddressPayload {
                    street: required(FieldId::BorrowerStreet),
                    city: required(FieldId::BorrowerCity),
                    state: required(FieldId::BorrowerState),
                    zip_code: required(FieldId::BorrowerZipCode),
                    country: required(FieldId::BorrowerCountry),
                },
                ssn_last4: required(FieldId::BorrowerSsnLast4),
                id_type: required(FieldId::BorrowerIdType),
                id_last4: required(FieldId::BorrowerIdLast4),
                employment_status: required(FieldId::BorrowerEmploymentStatus),
                annual_income: parse_decimal(
                    FieldId::BorrowerAnnualIncome,
                    self.get(FieldId::BorrowerAnnualIncome),
                )?,
                co_borrower_name: optional(FieldId::CoBorrowerName),
                co_borrower_email: optional(FieldId::CoBorrowerEmail),
            },
            metadata: self.extra.clone(),
        })
    }
}

fn borrower_field(key: &str) -> Option<FieldId> {
    FieldId::from_key(&format!("borrower_{}", key)).or_else(|| FieldId::from_key(key))
}

fn parse_decimal(field: FieldId, value: &str) -> Result<Decimal, SealError> {
    Decimal::from_str(value)
        .map_err(|_| SealError::InvalidInput(format!("{} is not a valid number", field.label())))
}

fn value_to_raw(value: &Value) -> Result<String, ()> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(()),
    }
}

/// A form with every required field filled with valid values.
#[cfg(test)]
pub(crate) fn complete_form() -> LoanForm {
    let mut form = LoanForm::new();
    for (field, value) in [
        (FieldId::LoanId, "LN-2026-0042"),
        (FieldId::DocumentType, "promissory_note"),
        (FieldId::LoanAmount, "$250,000.00"),
        (FieldId::CreatedBy, "loan.officer@example.com"),
        (FieldId::BorrowerFullName, "Jane Doe"),
        (FieldId::BorrowerDateOfBirth, "1985-02-28"),
        (FieldId::BorrowerEmail, "Jane.Doe@Example.com"),
        (FieldId::BorrowerPhone, "(555) 123-4567"),
        (FieldId::BorrowerStreet, "1 Market St"),
        (FieldId::BorrowerCity, "San Francisco"),
        (FieldId::BorrowerState, "CA"),
        (FieldId::BorrowerZipCode, "94105"),
        (FieldId::BorrowerSsnLast4, "6789"),
        (FieldId::BorrowerIdType, "passport"),
        (FieldId::BorrowerIdLast4, "X123"),
        (FieldId::BorrowerEmploymentStatus, "employed"),
        (FieldId::BorrowerAnnualIncome, "120000"),
    ] {
        assert!(form.set(field, value).is_none(), "{} rejected", field);
    }
    form
}
