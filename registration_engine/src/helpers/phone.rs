use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::db_types::PhoneNumber;

#[derive(Debug, Clone, Error)]
#[error("Invalid WhatsApp number: {0}")]
pub struct PhoneFormatError(pub String);

/// Normalize a WhatsApp number to its fully-qualified form.
///
/// Accepts either a bare 10-digit local number or one already carrying the `91` country prefix. Anything else is
/// a validation failure; lookups never run against an unvalidated number.
pub fn normalize_phone(raw: &str) -> Result<PhoneNumber, PhoneFormatError> {
    static LOCAL: OnceLock<Regex> = OnceLock::new();
    static PREFIXED: OnceLock<Regex> = OnceLock::new();
    let local = LOCAL.get_or_init(|| Regex::new(r"^\d{10}$").unwrap());
    let prefixed = PREFIXED.get_or_init(|| Regex::new(r"^91\d{10}$").unwrap());
    let trimmed = raw.trim();
    if local.is_match(trimmed) {
        Ok(PhoneNumber(format!("91{trimmed}")))
    } else if prefixed.is_match(trimmed) {
        Ok(PhoneNumber(trimmed.to_string()))
    } else {
        Err(PhoneFormatError(raw.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bare_local_numbers_gain_the_country_prefix() {
        assert_eq!(normalize_phone("9876543210").unwrap().as_str(), "919876543210");
    }

    #[test]
    fn prefixed_numbers_pass_through() {
        assert_eq!(normalize_phone("919876543210").unwrap().as_str(), "919876543210");
    }

    #[test]
    fn whitespace_is_tolerated() {
        assert_eq!(normalize_phone(" 9876543210 ").unwrap().as_str(), "919876543210");
    }

    #[test]
    fn other_shapes_are_validation_failures() {
        for bad in ["98765", "98765432101", "+919876543210", "abcdefghij", "929876543210", ""] {
            assert!(normalize_phone(bad).is_err(), "{bad} should be rejected");
        }
    }
}
