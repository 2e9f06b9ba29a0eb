use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DOCUMENT_TYPES: &[&str] = &[
    "loan_application",
    "promissory_note",
    "deed_of_trust",
    "closing_disclosure",
    "appraisal_report",
    "title_insurance",
    "other",
];

pub const ID_TYPES: &[&str] = &["drivers_license", "passport", "state_id", "military_id"];

pub const EMPLOYMENT_STATUSES: &[&str] = &[
    "employed",
    "self_employed",
    "unemployed",
    "retired",
    "student",
];

/// Semantic type of a form field. Decides which sanitizer runs on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { max_len: usize },
    Email,
    Phone,
    Date,
    PostalCode,
    Currency,
    /// Decimal percentage with up to four decimals
    Percentage,
    /// Digits only. `width` is enforced by validation, not by truncation.
    Digits { width: usize },
    /// ASCII letters and digits, uppercased. Exactly `width` long when valid.
    Alphanumeric { width: usize },
    Select(&'static [&'static str]),
}

/// Every named field of the loan/KYC form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    LoanId,
    DocumentType,
    LoanAmount,
    InterestRate,
    LoanTermMonths,
    PropertyAddress,
    AdditionalNotes,
    CreatedBy,
    BorrowerFullName,
    BorrowerDateOfBirth,
    BorrowerEmail,
    BorrowerPhone,
    BorrowerStreet,
    BorrowerCity,
    BorrowerState,
    BorrowerZipCode,
    BorrowerCountry,
    BorrowerSsnLast4,
    BorrowerIdType,
    BorrowerIdLast4,
    BorrowerEmploymentStatus,
    BorrowerAnnualIncome,
    CoBorrowerName,
    CoBorrowerEmail,
}

/// Static description of a field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const TEXT: FieldKind = FieldKind::Text { max_len: 200 };
const LONG_TEXT: FieldKind = FieldKind::Text { max_len: 500 };

impl FieldId {
    pub const ALL: [FieldId; 24] = [
        FieldId::LoanId,
        FieldId::DocumentType,
        FieldId::LoanAmount,
        FieldId::InterestRate,
        FieldId::LoanTermMonths,
        FieldId::PropertyAddress,
        FieldId::AdditionalNotes,
        FieldId::CreatedBy,
        FieldId::BorrowerFullName,
        FieldId::BorrowerDateOfBirth,
        FieldId::BorrowerEmail,
        FieldId::BorrowerPhone,
        FieldId::BorrowerStreet,
        FieldId::BorrowerCity,
        FieldId::BorrowerState,
        FieldId::BorrowerZipCode,
        FieldId::BorrowerCountry,
        FieldId::BorrowerSsnLast4,
        FieldId::BorrowerIdType,
        FieldId::BorrowerIdLast4,
        FieldId::BorrowerEmploymentStatus,
        FieldId::BorrowerAnnualIncome,
        FieldId::CoBorrowerName,
        FieldId::CoBorrowerEmail,
    ];

    pub fn spec(&self) -> FieldSpec {
        let (key, label, kind, required) = match self {
            FieldId::LoanId => ("loan_id", "Loan ID", TEXT, true),
            FieldId::DocumentType => (
                "document_type",
                "Document type",
                FieldKind::Select(DOCUMENT_TYPES),
                true,
            ),
            FieldId::LoanAmount => ("loan_amount", "Loan amount", FieldKind::Currency, true),
            FieldId::InterestRate => (
                "interest_rate",
                "Interest rate",
                FieldKind::Percentage,
                false,
            ),
            FieldId::LoanTermMonths => (
                "loan_term_months",
                "Loan term (months)",
                FieldKind::Digits { width: 3 },
                false,
            ),
            FieldId::PropertyAddress => ("property_address", "Property address", TEXT, false),
            FieldId::AdditionalNotes => ("additional_notes", "Additional notes", LONG_TEXT, false),
            FieldId::CreatedBy => ("created_by", "Created by", TEXT, true),
            FieldId::BorrowerFullName => ("borrower_full_name", "Full name", TEXT, true),
            FieldId::BorrowerDateOfBirth => (
                "borrower_date_of_birth",
                "Date of birth",
                FieldKind::Date,
                true,
            ),
            FieldId::BorrowerEmail => ("borrower_email", "Email", FieldKind::Email, true),
            FieldId::BorrowerPhone => ("borrower_phone", "Phone", FieldKind::Phone, true),
            FieldId::BorrowerStreet => ("borrower_street", "Street address", TEXT, true),
            FieldId::BorrowerCity => ("borrower_city", "City", TEXT, true),
            FieldId::BorrowerState => ("borrower_state", "State", TEXT, true),
            FieldId::BorrowerZipCode => (
                "borrower_zip_code",
                "ZIP code",
                FieldKind::PostalCode,
                true,
            ),
            FieldId::BorrowerCountry => ("borrower_country", "Country", TEXT, true),
            FieldId::BorrowerSsnLast4 => (
                "borrower_ssn_last4",
                "SSN (last 4)",
                FieldKind::Digits { width: 4 },
                true,
            ),
            FieldId::BorrowerIdType => (
                "borrower_id_type",
                "ID type",
                FieldKind::Select(ID_TYPES),
                true,
            ),
            FieldId::BorrowerIdLast4 => (
                "borrower_id_last4",
                "ID number (last 4)",
                FieldKind::Alphanumeric { width: 4 },
                true,
            ),
            FieldId::BorrowerEmploymentStatus => (
                "borrower_employment_status",
                "Employment status",
                FieldKind::Select(EMPLOYMENT_STATUSES),
                true,
            ),
            FieldId::BorrowerAnnualIncome => (
                "borrower_annual_income",
                "Annual income",
                FieldKind::Currency,
                true,
            ),
            FieldId::CoBorrowerName => ("co_borrower_name", "Co-borrower name", TEXT, false),
            FieldId::CoBorrowerEmail => (
                "co_borrower_email",
                "Co-borrower email",
                FieldKind::Email,
                false,
            ),
        };
        FieldSpec {
            key,
            label,
            kind,
            required,
        }
    }

    pub fn key(&self) -> &'static str {
        self.spec().key
    }

    pub fn label(&self) -> &'static str {
        self.spec().label
    }

    pub fn kind(&self) -> FieldKind {
        self.spec().kind
    }

    pub fn is_required(&self) -> bool {
        self.spec().required
    }

    pub fn from_key(key: &str) -> Option<FieldId> {
        FieldId::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl FromStr for FieldId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::from_key(s).ok_or_else(|| anyhow::anyhow!("Unknown form field: {}", s))
    }
}

impl Display for FieldId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.key())
    }
}
