use std::fmt::Write as _;

use blake2::{digest::consts::U16, Blake2b, Digest};

use crate::db_types::{AttendanceToken, PhoneNumber};

/// Derive the attendance token for a candidate record.
///
/// The token is a capability credential: it gates the staff-facing scan endpoint and must not be guessable from
/// public data, so the record id is hashed together with the registered phone number rather than exposed
/// directly. The derivation is deterministic, which makes the token stable for the record's lifetime.
pub fn attendance_token_for(candidate_id: i64, phone: &PhoneNumber) -> AttendanceToken {
    let mut hasher = Blake2b::<U16>::new();
    hasher.update(candidate_id.to_le_bytes());
    hasher.update(b":");
    hasher.update(phone.as_str().as_bytes());
    let digest = hasher.finalize();
    let token = digest.iter().fold(String::with_capacity(32), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    });
    AttendanceToken(token)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::helpers::normalize_phone;

    #[test]
    fn tokens_are_stable() {
        let phone = normalize_phone("9876543210").unwrap();
        assert_eq!(attendance_token_for(42, &phone), attendance_token_for(42, &phone));
    }

    #[test]
    fn tokens_differ_per_record() {
        let phone = normalize_phone("9876543210").unwrap();
        assert_ne!(attendance_token_for(1, &phone), attendance_token_for(2, &phone));
    }

    #[test]
    fn tokens_are_hex_and_fixed_width() {
        let phone = normalize_phone("9876543210").unwrap();
        let token = attendance_token_for(7, &phone);
        assert_eq!(token.as_str().len(), 32);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
