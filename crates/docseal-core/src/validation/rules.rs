use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fields::{FieldId, FieldKind};

const MIN_BORROWER_AGE: i32 = 18;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_LOAN_TERM_MONTHS: u32 = 600;

/// A single failed field, shown inline and in the submission summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: FieldId,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FieldId, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$").expect("valid email regex")
    })
}

fn postal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9 \-]{1,8}[A-Z0-9]$").expect("valid postal regex"))
}

/// Validate an already-sanitized value. Returns `None` when the value is acceptable.
pub fn validate_field(field: FieldId, value: &str) -> Option<FieldError> {
    let spec = field.spec();
    if value.is_empty() {
        return spec
            .required
            .then(|| FieldError::new(field, format!("{} is required", spec.label)));
    }

    let result = match spec.kind {
        FieldKind::Text { .. } => validate_text(field, value),
        FieldKind::Email => email_regex()
            .is_match(value)
            .then_some(())
            .ok_or_else(|| "Enter a valid email address".to_string()),
        FieldKind::Phone => {
            let digits = value.chars().filter(char::is_ascii_digit).count();
            (digits >= MIN_PHONE_DIGITS)
                .then_some(())
                .ok_or_else(|| "Phone number must have 10 to 15 digits".to_string())
        }
        FieldKind::Date => validate_date(field, value),
        FieldKind::PostalCode => postal_code_regex()
            .is_match(value)
            .then_some(())
            .ok_or_else(|| "Enter a valid postal code".to_string()),
        FieldKind::Currency | FieldKind::Percentage => validate_amount(field, value),
        FieldKind::Digits { width } => validate_digits(field, value, width),
        FieldKind::Alphanumeric { width } => (value.len() == width)
            .then_some(())
            .ok_or_else(|| format!("{} must be exactly {} characters", spec.label, width)),
        FieldKind::Select(options) => options
            .contains(&value)
            .then_some(())
            .ok_or_else(|| format!("Select a valid {}", spec.label.to_lowercase())),
    };

    result.err().map(|message| FieldError::new(field, message))
}

fn validate_text(field: FieldId, value: &str) -> Result<(), String> {
    match field {
        FieldId::BorrowerFullName | FieldId::CoBorrowerName if value.chars().count() < 2 => {
            Err("Name must be at least 2 characters".to_string())
        }
        _ => Ok(()),
    }
}

fn validate_date(field: FieldId, value: &str) -> Result<(), String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "Enter a date as YYYY-MM-DD".to_string())?;
    let today = Utc::now().date_naive();
    if date > today {
        return Err("Date cannot be in the future".to_string());
    }
    if field == FieldId::BorrowerDateOfBirth {
        if date.year() < 1900 {
            return Err("Enter a valid date of birth".to_string());
        }
        if age_on(date, today) < MIN_BORROWER_AGE {
            return Err("Borrower must be at least 18 years old".to_string());
        }
    }
    Ok(())
}

fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

fn validate_amount(field: FieldId, value: &str) -> Result<(), String> {
    let amount = Decimal::from_str(value).map_err(|_| "Enter a valid amount".to_string())?;
    match field {
        FieldId::LoanAmount if amount <= Decimal::ZERO => {
            Err("Loan amount must be greater than zero".to_string())
        }
        FieldId::InterestRate if amount > Decimal::ONE_HUNDRED => {
            Err("Interest rate must be between 0 and 100".to_string())
        }
        _ => Ok(()),
    }
}

fn validate_digits(field: FieldId, value: &str, width: usize) -> Result<(), String> {
    match field {
        FieldId::LoanTermMonths => {
            let months: u32 = value
                .parse()
                .map_err(|_| "Enter a whole number of months".to_string())?;
            if months == 0 || months > MAX_LOAN_TERM_MONTHS {
                return Err("Loan term must be between 1 and 600 months".to_string());
            }
            Ok(())
        }
        _ if value.len() != width => Err(format!(
            "{} must be exactly {} digits",
            field.label(),
            width
        )),
        _ => Ok(()),
    }
}
