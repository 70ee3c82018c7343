mod phone;
mod token;

use rand::{distributions::Alphanumeric, Rng};

pub use phone::{normalize_phone, PhoneFormatError};
pub use token::attendance_token_for;

/// Generate a fresh certificate document id: a short slug of the candidate name plus a random suffix.
/// Uniqueness is probabilistic but collisions are inconsequential; the id is a human-facing reference, the
/// artifact store assigns the canonical identifiers.
pub fn new_document_id(name: &str) -> String {
    let slug: String =
        name.chars().filter(|c| c.is_ascii_alphanumeric()).take(10).collect::<String>().to_ascii_uppercase();
    let slug = if slug.is_empty() { "CANDIDATE".to_string() } else { slug };
    let suffix: String =
        rand::thread_rng().sample_iter(Alphanumeric).take(8).map(char::from).collect::<String>().to_ascii_uppercase();
    format!("CERT-{slug}-{suffix}")
}

/// Generate a receipt tag for a new gateway order.
pub fn new_receipt() -> String {
    let suffix: String = rand::thread_rng().sample_iter(Alphanumeric).take(12).map(char::from).collect();
    format!("receipt_{suffix}")
}
