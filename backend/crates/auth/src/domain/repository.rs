//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{session::Session, user::User};
use crate::domain::service::lockout::{LockoutPolicy, LoginState};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Credential store: the `users` table
#[trait_variant::make(CredentialRepository: Send)]
pub trait LocalCredentialRepository {
    /// Insert a new user; a taken email is `AuthError::EmailTaken`
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn update_login_state(&self, user_id: &UserId, state: &LoginState) -> AuthResult<()>;

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()>;

    /// Atomically apply `LockoutPolicy::after_failure` to the row for `email`
    ///
    /// Returns the new state, or `None` when no account uses that email.
    async fn record_failed_login(
        &self,
        email: &Email,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<LoginState>>;
}

/// Session store: the `web_sessions` table
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn find(&self, session_id: &SessionId) -> AuthResult<Option<Session>>;

    /// Insert or overwrite (last writer wins)
    async fn save(&self, session: &Session) -> AuthResult<()>;

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()>;

    /// Delete sessions not written since `before`
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AuthResult<u64>;
}
