//! User Password Value Object
//!
//! Thin domain wrapper over `platform::password`. Registration goes through
//! the full strength policy; sign-in only normalizes, so accounts created
//! under an older policy can still authenticate.

use kernel::error::{
    app_error::{AppError, AppResult, ResultExt},
    kind::ErrorKind,
};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;
use std::sync::LazyLock;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Password exactly as typed, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a new password against the strength policy
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(policy_error)?;
        Ok(Self(clear_text))
    }

    /// Accept a sign-in attempt without the strength policy
    pub fn for_login(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::for_login(raw).map_err(policy_error)?;
        Ok(Self(clear_text))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

fn policy_error(e: PasswordPolicyError) -> AppError {
    let action = match e {
        PasswordPolicyError::TooShort { .. } => "Please choose a longer password",
        PasswordPolicyError::TooLong { .. } => "Please choose a shorter password",
        PasswordPolicyError::EmptyOrWhitespace => "Please enter a password",
        PasswordPolicyError::InvalidCharacter => "Please remove any special control characters",
        PasswordPolicyError::CommonPattern => "Please choose a more unique password",
    };
    AppError::bad_request(e.to_string()).with_action(action)
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id PHC string as stored in `users.password_hash`
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        let hashed = raw
            .inner()
            .hash(pepper)
            .map_app_err(ErrorKind::InternalServerError, "Password hashing failed")?;

        Ok(Self(hashed))
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string).map_app_err(
            ErrorKind::InternalServerError,
            "Invalid password hash in database",
        )?;

        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Constant-time verification; `pepper` must match the one used to hash
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }

    /// Spend one verification's worth of work when there is no stored hash
    ///
    /// Unknown emails and locked accounts go through this so a rejected
    /// sign-in takes as long as a wrong password. Always `false`.
    ///
    /// ## Arguments
    /// * `raw` - the submitted password
    /// * `pepper` - the configured pepper, so the cost matches a real verify
    pub fn verify_dummy(raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        #[cfg(test)]
        tests::DUMMY_VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        match DUMMY_HASH.as_ref() {
            Some(hash) => {
                let _ = hash.verify(raw.inner(), pepper);
            }
            None => tracing::error!("Dummy password hash unavailable"),
        }
        false
    }

    pub fn needs_rehash(&self) -> bool {
        self.0.needs_rehash()
    }
}

/// Hash of a throwaway password, computed with the default parameters on first use
static DUMMY_HASH: LazyLock<Option<HashedPassword>> = LazyLock::new(|| {
    ClearTextPassword::for_login("no-such-account-placeholder".to_string())
        .ok()
        .and_then(|clear_text| clear_text.hash(None).ok())
});

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
