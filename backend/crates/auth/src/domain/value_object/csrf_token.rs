//! CSRF token
//!
//! One random token per session, echoed back by state-changing forms.

use platform::crypto::{constant_time_eq, random_token};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// `byte_len` random bytes, base64url encoded
    pub fn generate(byte_len: usize) -> Self {
        Self(random_token(byte_len))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted value
    pub fn matches(&self, candidate: &str) -> bool {
        !candidate.is_empty() && constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CsrfToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = CsrfToken::generate(32);
        let b = CsrfToken::generate(32);
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(a.as_str().len(), 43);
    }

    #[test]
    fn test_matches() {
        let token = CsrfToken::generate(32);
        let copy = token.as_str().to_string();
        assert!(token.matches(&copy));
        assert!(!token.matches(""));
        assert!(!token.matches(&copy[..copy.len() - 1]));
        assert!(!token.matches(CsrfToken::generate(32).as_str()));
    }

    #[test]
    fn test_debug_redacted() {
        let token = CsrfToken::generate(16);
        assert!(!format!("{:?}", token).contains(token.as_str()));
    }
}
