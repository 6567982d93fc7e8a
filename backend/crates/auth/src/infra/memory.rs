//! In-memory repositories
//!
//! Same contract as the Postgres store, held in a mutex. Used by the test
//! suite and for running the server without a database. Either half can be
//! switched "down" to exercise store-failure paths.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::service::lockout::{LockoutPolicy, LoginState};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
    credentials_down: bool,
    sessions_down: bool,
    session_saves_down: bool,
    session_deletes_down: bool,
}

impl MemoryState {
    fn credentials(&mut self) -> AuthResult<&mut HashMap<UserId, User>> {
        if self.credentials_down {
            return Err(unavailable());
        }
        Ok(&mut self.users)
    }

    fn sessions(&mut self) -> AuthResult<&mut HashMap<SessionId, Session>> {
        if self.sessions_down {
            return Err(unavailable());
        }
        Ok(&mut self.sessions)
    }
}

fn unavailable() -> AuthError {
    AuthError::Database(sqlx::Error::PoolTimedOut)
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every credential call fail as if the database timed out
    pub async fn set_credentials_down(&self, down: bool) {
        self.state.lock().await.credentials_down = down;
    }

    pub async fn set_sessions_down(&self, down: bool) {
        self.state.lock().await.sessions_down = down;
    }

    /// Fail only `save`; reads and deletes keep working
    pub async fn set_session_saves_down(&self, down: bool) {
        self.state.lock().await.session_saves_down = down;
    }

    pub async fn set_session_deletes_down(&self, down: bool) {
        self.state.lock().await.session_deletes_down = down;
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

impl CredentialRepository for MemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        let users = state.credentials()?;

        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }

        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state
            .credentials()?
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state.credentials()?.get(user_id).cloned())
    }

    async fn update_login_state(&self, user_id: &UserId, login_state: &LoginState) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.credentials()?.get_mut(user_id) {
            user.login_state = *login_state;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.credentials()?.get_mut(user_id) {
            user.last_login_at = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }

    async fn record_failed_login(
        &self,
        email: &Email,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<LoginState>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.credentials()?.values_mut().find(|u| &u.email == email) else {
            return Ok(None);
        };

        user.login_state = policy.after_failure(&user.login_state, now);
        user.updated_at = now;
        Ok(Some(user.login_state))
    }
}

impl SessionRepository for MemoryAuthRepository {
    async fn find(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        let mut state = self.state.lock().await;
        Ok(state.sessions()?.get(session_id).cloned())
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if state.session_saves_down {
            return Err(unavailable());
        }
        state
            .sessions()?
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
        let mut state = self.state.lock().await;
        if state.session_deletes_down {
            return Err(unavailable());
        }
        state.sessions()?.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let sessions = state.sessions()?;
        let len = sessions.len();
        sessions.retain(|_, s| s.updated_at >= before);
        Ok((len - sessions.len()) as u64)
    }
}
