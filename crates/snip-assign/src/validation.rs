use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default payload ceiling in bytes.
pub const DEFAULT_MAX_URL_LEN: usize = 3000;

/// Checks a payload before it is handed to the assigner.
///
/// The assigner itself never validates; every surface that accepts payloads
/// from outside runs them through this first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlValidator {
    /// Longest accepted payload in bytes.
    pub max_len: usize,
    /// Accepted prefixes, compared byte-wise and case-sensitively.
    pub allowed_schemes: Vec<String>,
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_URL_LEN,
            allowed_schemes: vec!["http://".into(), "https://".into(), "ftp://".into()],
        }
    }
}

impl UrlValidator {
    /// Default schemes with a custom length ceiling.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len,
            ..Default::default()
        }
    }

    pub fn validate(&self, payload: &[u8]) -> Result<(), ValidationError> {
        if payload.is_empty() {
            return Err(ValidationError::Empty);
        }
        if payload.len() > self.max_len {
            return Err(ValidationError::TooLong {
                len: payload.len(),
                max: self.max_len,
            });
        }
        let allowed = self
            .allowed_schemes
            .iter()
            .any(|scheme| payload.starts_with(scheme.as_bytes()));
        if !allowed {
            return Err(ValidationError::UnsupportedScheme);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_schemes() {
        let v = UrlValidator::default();
        assert!(v.validate(b"http://example.com").is_ok());
        assert!(v.validate(b"https://example.com/a?b=c").is_ok());
        assert!(v.validate(b"ftp://files.example.com").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            UrlValidator::default().validate(b""),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn rejects_other_schemes() {
        let v = UrlValidator::default();
        for bad in [&b"javascript:alert(1)"[..], &b"example.com"[..], &b"HTTP://x"[..], &b"mailto:a@b"[..]] {
            assert_eq!(v.validate(bad), Err(ValidationError::UnsupportedScheme));
        }
    }

    #[test]
    fn length_ceiling_is_inclusive() {
        let v = UrlValidator::with_max_len(20);
        let exact = b"http://example.com/a"; // 20 bytes
        assert!(v.validate(exact).is_ok());
        let over = b"http://example.com/ab";
        assert_eq!(
            v.validate(over),
            Err(ValidationError::TooLong { len: 21, max: 20 })
        );
    }

    #[test]
    fn default_ceiling_is_3000() {
        let v = UrlValidator::default();
        let mut url = b"http://".to_vec();
        url.resize(3000, b'a');
        assert!(v.validate(&url).is_ok());
        url.push(b'a');
        assert!(matches!(v.validate(&url), Err(ValidationError::TooLong { .. })));
    }
}
