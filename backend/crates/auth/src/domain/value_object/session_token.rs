//! Signed session cookie value
//!
//! Format: `{session_uuid}.{base64url(HMAC-SHA256(secret, session_uuid))}`.
//! The signature keeps clients from probing the session store with guessed ids.

use kernel::id::SessionId;
use platform::crypto::{from_base64url, hmac_sign, hmac_verify, to_base64url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSessionToken(String);

impl SignedSessionToken {
    pub fn sign(session_id: &SessionId, secret: &[u8]) -> Self {
        let id = session_id.to_string();
        let tag = hmac_sign(secret, id.as_bytes());
        Self(format!("{}.{}", id, to_base64url(&tag)))
    }

    /// Recover the session id from a cookie value, or `None` if it was tampered with
    pub fn verify(raw: &str, secret: &[u8]) -> Option<SessionId> {
        let (id, tag) = raw.split_once('.')?;
        let tag = from_base64url(tag).ok()?;

        if !hmac_verify(secret, id.as_bytes(), &tag) {
            return None;
        }

        id.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_then_verify() {
        let id = SessionId::new();
        let token = SignedSessionToken::sign(&id, SECRET);
        assert_eq!(SignedSessionToken::verify(token.as_str(), SECRET), Some(id));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let id = SessionId::new();
        let token = SignedSessionToken::sign(&id, SECRET);
        assert_eq!(
            SignedSessionToken::verify(token.as_str(), b"another-secret-another-secret-xx"),
            None
        );
    }

    #[test]
    fn test_rejects_swapped_id() {
        let token = SignedSessionToken::sign(&SessionId::new(), SECRET);
        let (_, tag) = token.as_str().split_once('.').unwrap();
        let forged = format!("{}.{}", SessionId::new(), tag);
        assert_eq!(SignedSessionToken::verify(&forged, SECRET), None);
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "no-dot", ".", "abc.def", "not-a-uuid.AAAA"] {
            assert_eq!(SignedSessionToken::verify(raw, SECRET), None, "{raw:?}");
        }
    }
}
