//! Session Manager
//!
//! Loads the browser's session, binds and clears identities, enforces the
//! absolute session lifetime and hands out the CSRF token. Every change is
//! written back in one place (`commit`), after the handler has run.

use chrono::{DateTime, Utc};
use platform::cookie::CookieConfig;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::outcome::Outcome;
use crate::application::session_context::{SessionChange, SessionContext};
use crate::domain::entity::session::SessionUser;
use crate::domain::entity::user::User;
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::service::lockout::LoginState;
use crate::domain::value_object::{csrf_token::CsrfToken, session_token::SignedSessionToken};
use crate::error::AuthResult;

/// Result of the per-request lifetime check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCheck {
    /// No signed-in identity
    Anonymous,
    Active,
    /// Lifetime exceeded; the session has been logged out
    Expired,
}

/// `Set-Cookie` action produced by `commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    /// The browser already holds the right cookie
    Keep,
    Set(SignedSessionToken),
    Clear,
}

impl CookieDirective {
    pub fn to_header_value(&self, cookie: &CookieConfig) -> Option<String> {
        match self {
            CookieDirective::Keep => None,
            CookieDirective::Set(token) => Some(cookie.build_set_cookie(token.as_str())),
            CookieDirective::Clear => Some(cookie.build_delete_cookie()),
        }
    }
}

pub struct SessionManager<S, C>
where
    S: SessionRepository,
    C: CredentialRepository,
{
    sessions: Arc<S>,
    credentials: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<S, C> SessionManager<S, C>
where
    S: SessionRepository,
    C: CredentialRepository,
{
    pub fn new(sessions: Arc<S>, credentials: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions,
            credentials,
            config,
        }
    }

    /// Resolve the request's session from its cookie value
    ///
    /// A missing, forged or unknown cookie yields a fresh anonymous context.
    /// An anonymous row untouched for longer than the session lifetime is
    /// discarded: the context starts empty and `commit` deletes the row.
    /// Signed-in rows are left to [`Self::check_timeout`].
    ///
    /// ## Arguments
    /// * `cookie` - raw session cookie value, if the request carried one
    /// * `now` - request time
    ///
    /// ## Returns
    /// * `Ok(ctx)` - the context for this request
    /// * `Err(AuthError::Database(_))` - the session store could not be read
    ///
    /// ## Examples
    /// ```rust,ignore
    /// let cookie = extract_cookie(req.headers(), &manager.cookie_config().name);
    /// let ctx = manager.bootstrap(cookie.as_deref(), Utc::now()).await?;
    /// ```
    pub async fn bootstrap(
        &self,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<SessionContext> {
        let Some(raw) = cookie else {
            return Ok(SessionContext::fresh(now));
        };

        let Some(session_id) = SignedSessionToken::verify(raw, &self.config.session_secret) else {
            tracing::debug!("Ignoring session cookie with a bad signature");
            return Ok(SessionContext::fresh(now));
        };

        match self.sessions.find(&session_id).await? {
            Some(session)
                if !session.is_logged_in()
                    && session.is_idle(now, self.config.session_lifetime_chrono()) =>
            {
                tracing::debug!(session_id = %session_id, "Discarding idle anonymous session");
                let ctx = SessionContext::loaded(session);
                ctx.lock().await.destroy();
                Ok(ctx)
            }
            Some(session) => Ok(SessionContext::loaded(session)),
            None => {
                tracing::debug!(session_id = %session_id, "Session cookie refers to no stored session");
                Ok(SessionContext::fresh(now))
            }
        }
    }

    /// Log out sessions older than the configured lifetime
    ///
    /// The lifetime counts from sign-in; exactly `session_lifetime` is still valid.
    ///
    /// ## Returns
    /// * `TimeoutCheck::Expired` - the identity and CSRF token were dropped;
    ///   the caller should redirect with `timeout=1`
    pub async fn check_timeout(&self, ctx: &SessionContext, now: DateTime<Utc>) -> TimeoutCheck {
        let mut state = ctx.lock().await;

        if !state.session.is_logged_in() {
            return TimeoutCheck::Anonymous;
        }

        if !state
            .session
            .is_expired(now, self.config.session_lifetime_chrono())
        {
            return TimeoutCheck::Active;
        }

        if let Some(user) = state.session.user() {
            tracing::info!(
                user_id = %user.user_id,
                login_time = %user.login_time,
                "Session timed out"
            );
        }
        state.destroy();
        TimeoutCheck::Expired
    }

    /// Bind `user` to the session under a regenerated id
    ///
    /// Clearing the failure counter and stamping the last login are best
    /// effort: if the credential store is down the user is still signed in.
    ///
    /// ## Arguments
    /// * `ctx` - the request's session; its CSRF token carries over
    /// * `user` - the authenticated account
    /// * `now` - recorded as `login_time` and `last_login_at`
    ///
    /// ## Returns
    /// Degradations `reset_login_attempts` and `update_last_login` for the
    /// bookkeeping writes that failed.
    pub async fn login(&self, ctx: &SessionContext, user: &User, now: DateTime<Utc>) -> Outcome<()> {
        ctx.lock()
            .await
            .sign_in(SessionUser::from_user(user, now), now);

        let mut outcome = Outcome::ok(());

        if let Err(e) = self
            .credentials
            .update_login_state(&user.user_id, &LoginState::cleared())
            .await
        {
            outcome.record("reset_login_attempts", e);
        }

        if let Err(e) = self.credentials.update_last_login(&user.user_id, now).await {
            outcome.record("update_last_login", e);
        }

        tracing::info!(user_id = %user.user_id, role = %user.role, "User signed in");

        outcome
    }

    /// Clear the session; its row and cookie are removed on commit
    pub async fn logout(&self, ctx: &SessionContext) {
        let mut state = ctx.lock().await;
        if let Some(user) = state.session.user() {
            tracing::info!(user_id = %user.user_id, "User signed out");
        }
        state.destroy();
    }

    pub async fn is_logged_in(&self, ctx: &SessionContext) -> bool {
        ctx.is_logged_in().await
    }

    pub async fn current_user(&self, ctx: &SessionContext) -> Option<SessionUser> {
        ctx.current_user().await
    }

    /// The session's CSRF token, created on first use
    ///
    /// Creating the token makes an anonymous session worth storing, so the
    /// first call on a fresh context leads to a `Set-Cookie` at commit.
    pub async fn issue_csrf(&self, ctx: &SessionContext) -> CsrfToken {
        let mut state = ctx.lock().await;
        let (token, created) = state
            .session
            .csrf_token_or_insert(self.config.csrf_token_length);
        let token = token.clone();
        if created {
            state.mark_dirty();
        }
        token
    }

    /// `false` when the session never had a token
    pub async fn verify_csrf(&self, ctx: &SessionContext, candidate: &str) -> bool {
        ctx.lock().await.session.verify_csrf(candidate)
    }

    /// Write the request's changes back to the store
    ///
    /// A new or regenerated row is saved before the previous one is deleted,
    /// so a failed save leaves the browser's existing session usable. Once the
    /// save succeeded, failing to delete the previous row is a degradation.
    ///
    /// ## Arguments
    /// * `ctx` - the request's session
    /// * `now` - stored as `updated_at`
    ///
    /// ## Returns
    /// * `Ok(outcome)` - the `Set-Cookie` action for the response
    /// * `Err(AuthError::Database(_))` - the session could not be saved, or a
    ///   logout could not remove its row
    pub async fn commit(
        &self,
        ctx: &SessionContext,
        now: DateTime<Utc>,
    ) -> AuthResult<Outcome<CookieDirective>> {
        let mut state = ctx.lock().await;
        let change = state.change();

        let directive = match change {
            SessionChange::Unchanged => CookieDirective::Keep,
            SessionChange::Destroyed => {
                if let Some(previous) = state.stored_id {
                    self.sessions.delete(&previous).await?;
                }
                CookieDirective::Clear
            }
            SessionChange::Modified | SessionChange::Regenerated => {
                state.session.updated_at = now;
                self.sessions.save(&state.session).await?;

                if state.stored_id == Some(state.session.session_id) {
                    CookieDirective::Keep
                } else {
                    CookieDirective::Set(SignedSessionToken::sign(
                        &state.session.session_id,
                        &self.config.session_secret,
                    ))
                }
            }
        };

        let mut outcome = Outcome::ok(directive);

        if change == SessionChange::Regenerated {
            if let Some(previous) = state.stored_id {
                if let Err(e) = self.sessions.delete(&previous).await {
                    outcome.record("delete_previous_session", e);
                }
            }
        }

        state.committed();
        Ok(outcome)
    }

    /// Cookie attributes for both issuing and expiring the session cookie
    pub fn cookie_config(&self) -> CookieConfig {
        self.config.session_cookie()
    }

    /// Remove rows idle for longer than the session lifetime
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let before = now
            .checked_sub_signed(self.config.session_lifetime_chrono())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let deleted = self.sessions.cleanup_expired(before).await?;
        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");
        Ok(deleted)
    }
}
