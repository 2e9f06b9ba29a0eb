use anyhow::Context;
use docseal_core::FieldId;
use serde::Serialize;

/// Shown once per state directory before the first seal.
pub const PRIVACY_NOTICE: &str = "Privacy notice: borrower KYC data entered here is sent to the \
sealing service. Only the last four digits of SSN and ID numbers are collected. \
Run `docseal privacy-notice dismiss` to stop showing this message.";

/// Parse a `--set key=value` argument into a form field and raw value.
pub fn parse_field_assignment(arg: &str) -> anyhow::Result<(FieldId, String)> {
    let (key, value) = arg
        .split_once('=')
        .with_context(|| format!("Expected key=value, got '{}'", arg))?;
    let field: FieldId = key.trim().parse()?;
    Ok((field, value.to_string()))
}

/// Shorten a hash for one-line display.
pub fn short_hash(hash: &str) -> String {
    if hash.len() <= 16 {
        hash.to_string()
    } else {
        format!("{}…{}", &hash[..8], &hash[hash.len() - 8..])
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_assignment_valid() {
        let (field, value) = parse_field_assignment("borrower_email=Jane@Example.com").unwrap();
        assert_eq!(field, FieldId::BorrowerEmail);
        assert_eq!(value, "Jane@Example.com");

        let (field, value) = parse_field_assignment("additional_notes=a=b").unwrap();
        assert_eq!(field, FieldId::AdditionalNotes);
        assert_eq!(value, "a=b");
    }

    #[test]
    fn parse_field_assignment_invalid() {
        assert!(parse_field_assignment("borrower_email").is_err());
        assert!(parse_field_assignment("favourite_colour=blue").is_err());
    }

    #[test]
    fn short_hash_keeps_ends() {
        let hash = "0123456789abcdef".repeat(4);
        assert_eq!(short_hash(&hash), "01234567…89abcdef");
        assert_eq!(short_hash("abc"), "abc");
    }
}
