//! Lockout Guard
//!
//! Counts consecutive failed sign-ins per account and answers whether an
//! account is currently locked. Store trouble never blocks the caller: it
//! is reported as a degradation and the configured fallback applies.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::outcome::Outcome;
use crate::domain::entity::user::User;
use crate::domain::repository::CredentialRepository;
use crate::domain::service::lockout::{LockoutPolicy, LoginState};
use crate::domain::value_object::email::Email;

pub struct LockoutGuard<C>
where
    C: CredentialRepository,
{
    credentials: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<C> LockoutGuard<C>
where
    C: CredentialRepository,
{
    pub fn new(credentials: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            credentials,
            config,
        }
    }

    pub fn policy(&self) -> LockoutPolicy {
        self.config.lockout_policy()
    }

    /// Count one failed attempt against `email`
    ///
    /// ## Arguments
    /// * `email` - the address the attempt was made with
    /// * `now` - attempt time; a lock set now ends at `now + lockout_duration`
    ///
    /// ## Returns
    /// The account's new login state, or `None` when no account uses the
    /// email. A store failure yields `None` with a `record_failed_login`
    /// degradation.
    pub async fn record_failed_login(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Outcome<Option<LoginState>> {
        let policy = self.policy();

        match self
            .credentials
            .record_failed_login(email, &policy, now)
            .await
        {
            Ok(Some(state)) => {
                if state.login_attempts == policy.max_attempts {
                    tracing::warn!(
                        email_domain = email.domain(),
                        attempts = state.login_attempts,
                        locked_until = ?state.locked_until,
                        "Account locked after repeated failed sign-ins"
                    );
                }
                Outcome::ok(Some(state))
            }
            Ok(None) => Outcome::ok(None),
            Err(e) => Outcome::degraded(None, "record_failed_login", e),
        }
    }

    /// Whether `user_id` may not sign in right now
    ///
    /// ## Returns
    /// The lock state from a fresh read. When the read fails the value is
    /// `lockout_fail_closed` and the outcome carries `check_lockout`.
    ///
    /// ## Examples
    /// ```rust,ignore
    /// let guard = LockoutGuard::new(repo.clone(), config.clone());
    /// if guard.is_account_locked(&user_id, Utc::now()).await.into_value() {
    ///     return Err(AuthError::AccountLocked);
    /// }
    /// ```
    pub async fn is_account_locked(&self, user_id: &UserId, now: DateTime<Utc>) -> Outcome<bool> {
        match self.credentials.find_by_id(user_id).await {
            Ok(Some(user)) => Outcome::ok(self.is_locked(&user, now)),
            Ok(None) => Outcome::ok(false),
            Err(e) => Outcome::degraded(self.config.lockout_fail_closed, "check_lockout", e),
        }
    }

    /// Pure check on an already loaded record
    pub fn is_locked(&self, user: &User, now: DateTime<Utc>) -> bool {
        self.policy().is_locked(&user.login_state, now)
    }
}
