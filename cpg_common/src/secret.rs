use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A thin wrapper that keeps confidential configuration values (API keys, HMAC secrets) out of log output.
/// The value must be asked for explicitly via [`Secret::reveal`]; `Debug` and `Display` always redact.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl Secret<String> {
    /// True if no secret has been configured at all. Callers use this to fail closed rather than
    /// verifying against an empty key.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_redacted() {
        let secret = Secret::new("hunter2".to_string());
        assert_eq!(format!("{secret:?}"), "****");
        assert_eq!(secret.to_string(), "****");
        assert_eq!(secret.reveal(), "hunter2");
    }

    #[test]
    fn empty_secret_is_detected() {
        assert!(Secret::<String>::default().is_empty());
        assert!(!Secret::new("k".to_string()).is_empty());
    }
}
