//! Per-kind input sanitizers.
//!
//! Every form write goes through [`sanitize`]; later validation and submission
//! only ever see the sanitized value.

use super::fields::FieldKind;

const MAX_EMAIL_LEN: usize = 254;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_DATE_LEN: usize = 10;
const MAX_POSTAL_LEN: usize = 10;
const MAX_CURRENCY_DECIMALS: usize = 2;
const MAX_PERCENTAGE_DECIMALS: usize = 4;
/// Upper bound on digit and alphanumeric codes, so oversized pastes stay
/// visible to the validator without growing unbounded.
const MAX_CODE_LEN: usize = 32;

pub fn sanitize(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::Text { max_len } => sanitize_text(raw, max_len),
        FieldKind::Email => sanitize_email(raw),
        FieldKind::Phone => sanitize_phone(raw),
        FieldKind::Date => sanitize_date(raw),
        FieldKind::PostalCode => sanitize_postal_code(raw),
        FieldKind::Currency => sanitize_decimal(raw, MAX_CURRENCY_DECIMALS),
        FieldKind::Percentage => sanitize_decimal(raw, MAX_PERCENTAGE_DECIMALS),
        FieldKind::Digits { .. } => raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(MAX_CODE_LEN)
            .collect(),
        FieldKind::Alphanumeric { .. } => raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(MAX_CODE_LEN)
            .collect::<String>()
            .to_uppercase(),
        FieldKind::Select(options) => sanitize_select(raw, options),
    }
}

fn sanitize_text(raw: &str, max_len: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect();
    cleaned.trim().chars().take(max_len).collect()
}

fn sanitize_email(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(MAX_EMAIL_LEN)
        .collect::<String>()
        .to_lowercase()
}

fn sanitize_phone(raw: &str) -> String {
    let trimmed = raw.trim_start();
    let mut out = String::new();
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(
        trimmed
            .chars()
            .filter(char::is_ascii_digit)
            .take(MAX_PHONE_DIGITS),
    );
    out
}

fn sanitize_date(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .take(MAX_DATE_LEN)
        .collect()
}

fn sanitize_postal_code(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-')
        .collect();
    kept.trim()
        .chars()
        .take(MAX_POSTAL_LEN)
        .collect::<String>()
        .to_uppercase()
}

fn sanitize_decimal(raw: &str, max_decimals: usize) -> String {
    let mut out = String::new();
    let mut seen_dot = false;
    let mut decimals = 0;
    for c in raw.chars() {
        match c {
            '0'..='9' => {
                if seen_dot {
                    if decimals == max_decimals {
                        continue;
                    }
                    decimals += 1;
                }
                out.push(c);
            }
            '.' if !seen_dot => {
                seen_dot = true;
                out.push(c);
            }
            _ => {}
        }
    }
    out
}

fn sanitize_select(raw: &str, options: &[&str]) -> String {
    let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
    if options.contains(&normalized.as_str()) {
        normalized
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::fields::{EMPLOYMENT_STATUSES, ID_TYPES};

    #[test]
    fn text_is_trimmed_and_stripped() {
        let kind = FieldKind::Text { max_len: 200 };
        assert_eq!(sanitize(kind, "  Jane Doe \n"), "Jane Doe");
        assert_eq!(sanitize(kind, "<script>x</script>"), "scriptx/script");
        assert_eq!(sanitize(FieldKind::Text { max_len: 3 }, "abcdef"), "abc");
    }

    #[test]
    fn email_is_lowercased_without_spaces() {
        assert_eq!(sanitize(FieldKind::Email, " Jane.Doe @Example.COM "), "jane.doe@example.com");
    }

    #[test]
    fn phone_strips_formatting() {
        assert_eq!(sanitize(FieldKind::Phone, "(555) 123-4567"), "5551234567");
        assert_eq!(sanitize(FieldKind::Phone, " +1 555.123.4567"), "+15551234567");
        assert_eq!(sanitize(FieldKind::Phone, "1234567890123456789"), "123456789012345");
    }

    #[test]
    fn date_keeps_digits_and_dashes() {
        assert_eq!(sanitize(FieldKind::Date, "1990-05-17T00:00:00Z"), "1990-05-17");
        assert_eq!(sanitize(FieldKind::Date, "1990/05/17"), "19900517");
    }

    #[test]
    fn postal_code_is_uppercased() {
        assert_eq!(sanitize(FieldKind::PostalCode, " 94105-1234 "), "94105-1234");
        assert_eq!(sanitize(FieldKind::PostalCode, "sw1a 1aa!"), "SW1A 1AA");
    }

    #[test]
    fn currency_drops_symbols_and_extra_decimals() {
        assert_eq!(sanitize(FieldKind::Currency, "$250,000.999"), "250000.99");
        assert_eq!(sanitize(FieldKind::Currency, "1.2.3"), "1.23");
        assert_eq!(sanitize(FieldKind::Currency, "-45"), "45");
    }

    #[test]
    fn percentage_keeps_four_decimals() {
        assert_eq!(sanitize(FieldKind::Percentage, "6.125%"), "6.125");
        assert_eq!(sanitize(FieldKind::Percentage, "5.123456"), "5.1234");
    }

    #[test]
    fn digits_and_alphanumerics_keep_every_character() {
        assert_eq!(
            sanitize(FieldKind::Digits { width: 4 }, "123-45-6789"),
            "123456789"
        );
        assert_eq!(sanitize(FieldKind::Digits { width: 3 }, "1000"), "1000");
        assert_eq!(sanitize(FieldKind::Alphanumeric { width: 4 }, "d-12x9"), "D12X9");
        assert_eq!(sanitize(FieldKind::Digits { width: 4 }, &"9".repeat(40)).len(), 32);
    }

    #[test]
    fn select_normalizes_or_clears() {
        assert_eq!(
            sanitize(FieldKind::Select(EMPLOYMENT_STATUSES), "Self-Employed"),
            "self_employed"
        );
        assert_eq!(
            sanitize(FieldKind::Select(ID_TYPES), "Drivers License"),
            "drivers_license"
        );
        assert_eq!(sanitize(FieldKind::Select(ID_TYPES), "library card"), "");
    }
}
