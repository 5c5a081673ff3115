//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates an ISO 4217 style currency code.
///
/// Requirements:
/// - Exactly 3 characters
/// - Upper-case ASCII letters only
pub fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() != 3 {
        return Err(ValidationError::new("currency_invalid_length"));
    }

    if !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new("currency_invalid_characters"));
    }

    Ok(())
}

/// Parses a path identifier; ids start at 1.
pub fn parse_positive_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_rejects_wrong_length() {
        assert!(validate_currency("").is_err());
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("USDT").is_err());
    }

    #[test]
    fn currency_rejects_lowercase_and_digits() {
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("U5D").is_err());
    }

    #[test]
    fn currency_accepts_valid() {
        assert!(validate_currency("UAH").is_ok());
    }

    #[test]
    fn positive_id_rejects_zero_negative_and_text() {
        assert_eq!(parse_positive_id("0"), None);
        assert_eq!(parse_positive_id("-4"), None);
        assert_eq!(parse_positive_id("abc"), None);
        assert_eq!(parse_positive_id("17"), Some(17));
    }
}
