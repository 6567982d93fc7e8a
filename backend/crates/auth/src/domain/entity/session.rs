//! Session Entity
//!
//! Server-side state for one browser. Anonymous until sign-in; may hold a
//! CSRF token either way.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;
use crate::domain::value_object::{
    csrf_token::CsrfToken,
    email::Email,
    user_role::{self, UserRole},
};

/// Signed-in identity snapshot taken at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default, deserialize_with = "user_role::deserialize_lenient")]
    pub role: Option<UserRole>,
    pub login_time: DateTime<Utc>,
}

impl SessionUser {
    pub fn from_user(user: &User, login_time: DateTime<Utc>) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: Some(user.role),
            login_time,
        }
    }

    pub fn has_role(&self, required: UserRole) -> bool {
        user_role::has_role(self.role, required)
    }
}

/// Serialized into `web_sessions.payload`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub csrf_token: Option<CsrfToken>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub payload: SessionPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Fresh anonymous session (not yet stored)
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::new(),
            payload: SessionPayload::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.payload.user.as_ref()
    }

    /// An identity is present and carries a known role
    pub fn is_logged_in(&self) -> bool {
        self.user().is_some_and(|u| u.role.is_some())
    }

    pub fn has_role(&self, required: UserRole) -> bool {
        self.user().is_some_and(|u| u.has_role(required))
    }

    /// Strictly more than `lifetime` since login
    pub fn is_expired(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        self.user()
            .is_some_and(|u| now.signed_duration_since(u.login_time) > lifetime)
    }

    /// Strictly more than `lifetime` since the last write
    pub fn is_idle(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        now.signed_duration_since(self.updated_at) > lifetime
    }

    /// Bind an identity under a brand-new id; the CSRF token is kept
    pub fn sign_in(&mut self, user: SessionUser, now: DateTime<Utc>) {
        self.session_id = SessionId::new();
        self.payload.user = Some(user);
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn clear(&mut self) {
        self.payload = SessionPayload::default();
    }

    /// Existing token, or a new one of `byte_len` random bytes
    pub fn csrf_token_or_insert(&mut self, byte_len: usize) -> (&CsrfToken, bool) {
        let created = self.payload.csrf_token.is_none();
        let token = self
            .payload
            .csrf_token
            .get_or_insert_with(|| CsrfToken::generate(byte_len));
        (token, created)
    }

    pub fn verify_csrf(&self, candidate: &str) -> bool {
        self.payload
            .csrf_token
            .as_ref()
            .is_some_and(|t| t.matches(candidate))
    }
}
