//! Per-request session state
//!
//! Created by the session middleware, shared with handlers through request
//! extensions, and written back once the handler has finished.

use chrono::{DateTime, Utc};
use kernel::id::SessionId;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::entity::session::{Session, SessionUser};
use crate::domain::value_object::user_role::UserRole;
use crate::error::AccessDenied;

/// What the request did to its session, as seen at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    /// Written under the id the browser already holds (or a brand-new one)
    Modified,
    /// Written under a new id; the previous row goes away
    Regenerated,
    /// Logged out; the previous row goes away and nothing replaces it
    Destroyed,
}

#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Mutex<ContextState>>,
}

#[derive(Debug)]
pub(crate) struct ContextState {
    pub(crate) session: Session,
    /// Row this request loaded, if any
    pub(crate) stored_id: Option<SessionId>,
    pub(crate) dirty: bool,
    pub(crate) destroyed: bool,
}

impl ContextState {
    pub(crate) fn change(&self) -> SessionChange {
        let replaced = self
            .stored_id
            .is_some_and(|id| id != self.session.session_id);

        match (self.dirty, replaced || self.destroyed) {
            (true, true) if self.stored_id.is_some() => SessionChange::Regenerated,
            (true, _) => SessionChange::Modified,
            (false, true) => SessionChange::Destroyed,
            (false, false) => SessionChange::Unchanged,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn sign_in(&mut self, user: SessionUser, now: DateTime<Utc>) {
        self.session.sign_in(user, now);
        self.dirty = true;
    }

    /// Drop everything; later writes in the same request start a new row
    pub(crate) fn destroy(&mut self) {
        self.session.clear();
        self.session.session_id = SessionId::new();
        self.dirty = false;
        self.destroyed = true;
    }

    /// After a successful commit the stored row matches memory again
    pub(crate) fn committed(&mut self) {
        self.stored_id = if self.dirty {
            Some(self.session.session_id)
        } else if self.destroyed {
            None
        } else {
            self.stored_id
        };
        self.dirty = false;
        self.destroyed = false;
    }
}

impl SessionContext {
    /// Context for a session that exists in the store
    pub(crate) fn loaded(session: Session) -> Self {
        let stored_id = Some(session.session_id);
        Self::with_state(ContextState {
            session,
            stored_id,
            dirty: false,
            destroyed: false,
        })
    }

    /// Anonymous context; nothing is stored until something is written
    pub(crate) fn fresh(now: DateTime<Utc>) -> Self {
        Self::with_state(ContextState {
            session: Session::new(now),
            stored_id: None,
            dirty: false,
            destroyed: false,
        })
    }

    fn with_state(state: ContextState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.inner.lock().await
    }

    pub async fn session_id(&self) -> SessionId {
        self.lock().await.session.session_id
    }

    pub async fn is_stored(&self) -> bool {
        self.lock().await.stored_id.is_some()
    }

    pub async fn change(&self) -> SessionChange {
        self.lock().await.change()
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.lock().await.session.user().cloned()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.lock().await.session.is_logged_in()
    }

    pub async fn has_role(&self, required: UserRole) -> bool {
        self.lock().await.session.has_role(required)
    }

    /// Signed-in identity, or a redirect to the login page
    pub async fn require_login(&self) -> Result<SessionUser, AccessDenied> {
        let state = self.lock().await;
        match state.session.user() {
            Some(user) if state.session.is_logged_in() => Ok(user.clone()),
            _ => Err(AccessDenied::LoginRequired),
        }
    }

    /// Signed-in identity holding at least `required`
    pub async fn require_role(&self, required: UserRole) -> Result<SessionUser, AccessDenied> {
        let user = self.require_login().await?;
        if user.has_role(required) {
            Ok(user)
        } else {
            tracing::info!(
                user_id = %user.user_id,
                required = %required,
                "Role check failed"
            );
            Err(AccessDenied::Forbidden)
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::email::Email;
    use kernel::id::UserId;

    fn identity(role: UserRole) -> SessionUser {
        SessionUser {
            user_id: UserId::new(),
            name: "Dealer".to_string(),
            email: Email::new("dealer@example.com").unwrap(),
            role: Some(role),
            login_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fresh_context_is_anonymous_and_unchanged() {
        let ctx = SessionContext::fresh(Utc::now());
        assert!(!ctx.is_logged_in().await);
        assert!(!ctx.is_stored().await);
        assert_eq!(ctx.change().await, SessionChange::Unchanged);
        assert_eq!(ctx.require_login().await, Err(AccessDenied::LoginRequired));
    }

    #[tokio::test]
    async fn test_change_tracking() {
        let ctx = SessionContext::loaded(Session::new(Utc::now()));
        assert_eq!(ctx.change().await, SessionChange::Unchanged);

        ctx.lock().await.mark_dirty();
        assert_eq!(ctx.change().await, SessionChange::Modified);

        ctx.lock().await.sign_in(identity(UserRole::Customer), Utc::now());
        assert_eq!(ctx.change().await, SessionChange::Regenerated);

        ctx.lock().await.destroy();
        assert_eq!(ctx.change().await, SessionChange::Destroyed);
    }

    #[tokio::test]
    async fn test_first_write_of_fresh_session_is_modified() {
        let ctx = SessionContext::fresh(Utc::now());
        ctx.lock().await.sign_in(identity(UserRole::Customer), Utc::now());
        assert_eq!(ctx.change().await, SessionChange::Modified);
    }

    #[tokio::test]
    async fn test_committed_resets_tracking() {
        let ctx = SessionContext::fresh(Utc::now());
        ctx.lock().await.mark_dirty();
        ctx.lock().await.committed();
        assert!(ctx.is_stored().await);
        assert_eq!(ctx.change().await, SessionChange::Unchanged);

        ctx.lock().await.destroy();
        ctx.lock().await.committed();
        assert!(!ctx.is_stored().await);
    }

    #[tokio::test]
    async fn test_require_role() {
        let ctx = SessionContext::fresh(Utc::now());
        ctx.lock().await.sign_in(identity(UserRole::Staff), Utc::now());

        assert!(ctx.require_role(UserRole::Customer).await.is_ok());
        assert!(ctx.require_role(UserRole::Staff).await.is_ok());
        assert_eq!(
            ctx.require_role(UserRole::Admin).await,
            Err(AccessDenied::Forbidden)
        );
    }
}
