//! Sign In Use Case
//!
//! Checks an email/password pair and, on success, signs the request's
//! session in.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::lockout_guard::LockoutGuard;
use crate::application::outcome::Outcome;
use crate::application::session_context::SessionContext;
use crate::application::session_manager::SessionManager;
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutput {
    pub user_id: UserId,
    pub role: UserRole,
}

/// Sign in use case
pub struct SignInUseCase<C, S>
where
    C: CredentialRepository,
    S: SessionRepository,
{
    credentials: Arc<C>,
    sessions: SessionManager<S, C>,
    lockout: LockoutGuard<C>,
    config: Arc<AuthConfig>,
}

impl<C, S> SignInUseCase<C, S>
where
    C: CredentialRepository,
    S: SessionRepository,
{
    pub fn new(credentials: Arc<C>, sessions: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionManager::new(sessions, credentials.clone(), config.clone()),
            lockout: LockoutGuard::new(credentials.clone(), config.clone()),
            credentials,
            config,
        }
    }

    /// Every rejection is `InvalidCredentials` or `AccountLocked`, which the
    /// client sees as the same message. Only a failed user lookup is fatal.
    ///
    /// Every rejection with a usable password runs exactly one Argon2id
    /// verify, so response time does not tell whether the email is registered.
    ///
    /// ## Arguments
    /// * `ctx` - the request's session; signed in on success
    /// * `input` - submitted email and password
    /// * `now` - clock for the lockout window and `login_time`
    ///
    /// ## Returns
    /// * `Ok(outcome)` - signed in; `outcome` lists any bookkeeping that failed
    /// * `Err(AuthError::Database(_))` - the credential store could not be read
    pub async fn execute(
        &self,
        ctx: &SessionContext,
        input: SignInInput,
        now: DateTime<Utc>,
    ) -> AuthResult<Outcome<SignInOutput>> {
        let pepper = self.config.pepper();
        let password = RawPassword::for_login(input.password).ok();

        let Ok(email) = Email::new(&input.email) else {
            burn_verify(password.as_ref(), pepper);
            tracing::info!("Sign-in rejected: malformed email");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(user) = self.credentials.find_by_email(&email).await? else {
            burn_verify(password.as_ref(), pepper);
            let recorded = self.lockout.record_failed_login(&email, now).await;
            tracing::info!(
                email_domain = email.domain(),
                degraded = recorded.is_degraded(),
                "Sign-in rejected: unknown email"
            );
            return Err(AuthError::InvalidCredentials);
        };

        if self.lockout.is_locked(&user, now) {
            burn_verify(password.as_ref(), pepper);
            tracing::info!(user_id = %user.user_id, "Sign-in rejected: account locked");
            return Err(AuthError::AccountLocked);
        }

        let password_ok = password
            .as_ref()
            .is_some_and(|raw| user.password_hash.verify(raw, pepper));

        if !password_ok {
            let recorded = self.lockout.record_failed_login(&user.email, now).await;
            tracing::info!(
                user_id = %user.user_id,
                attempts = recorded.value().as_ref().map(|s| s.login_attempts),
                "Sign-in rejected: wrong password"
            );
            return Err(AuthError::InvalidCredentials);
        }

        if user.password_hash.needs_rehash() {
            tracing::debug!(user_id = %user.user_id, "Password hash uses outdated parameters");
        }

        let outcome = self.sessions.login(ctx, &user, now).await;

        Ok(outcome.map(|()| SignInOutput {
            user_id: user.user_id,
            role: user.role,
        }))
    }
}

/// Verify against the placeholder hash; an unusable password skips it on every path alike
fn burn_verify(password: Option<&RawPassword>, pepper: Option<&[u8]>) {
    if let Some(raw) = password {
        let _ = UserPassword::verify_dummy(raw, pepper);
    }
}
