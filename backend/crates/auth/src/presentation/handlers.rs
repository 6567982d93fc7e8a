//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    RegisterInput, RegisterUseCase, SessionContext, SessionManager, SignInInput, SignInUseCase,
};
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult, LOGIN_PATH};
use crate::presentation::dto::{
    CsrfResponse, LoginForm, LogoutForm, RegisterForm, RegisterResponse, SessionStatusResponse,
};

/// Header alternative to the `csrf_token` form field
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthAppState<R>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }

    pub fn session_manager(&self) -> SessionManager<R, R> {
        SessionManager::new(self.repo.clone(), self.repo.clone(), self.config.clone())
    }
}

/// First page a freshly signed-in user lands on
pub fn landing_path(role: UserRole) -> &'static str {
    match role {
        UserRole::Admin => "/admin",
        UserRole::Staff => "/staff/orders",
        UserRole::Customer => "/account",
    }
}

/// Form field wins over the header when both are present
async fn require_csrf<R>(
    manager: &SessionManager<R, R>,
    ctx: &SessionContext,
    headers: &HeaderMap,
    form_token: Option<&str>,
) -> AuthResult<()>
where
    R: CredentialRepository + SessionRepository,
{
    let candidate = form_token
        .filter(|t| !t.is_empty())
        .or_else(|| headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()));

    match candidate {
        Some(token) if manager.verify_csrf(ctx, token).await => Ok(()),
        _ => Err(AuthError::CsrfMismatch),
    }
}

// ============================================================================
// CSRF
// ============================================================================

/// GET /auth/csrf
pub async fn csrf_token<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
) -> Json<CsrfResponse>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let token = state.session_manager().issue_csrf(&ctx).await;

    Json(CsrfResponse {
        csrf_token: token.as_str().to_string(),
    })
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> AuthResult<Response>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    require_csrf(
        &state.session_manager(),
        &ctx,
        &headers,
        form.csrf_token.as_deref(),
    )
    .await?;

    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let input = SignInInput {
        email: form.email,
        password: form.password,
    };

    let outcome = use_case.execute(&ctx, input, Utc::now()).await?;

    if outcome.is_degraded() {
        tracing::warn!(
            steps = ?outcome.degraded_steps(),
            "Signed in with incomplete bookkeeping"
        );
    }

    let output = outcome.into_value();

    Ok(Redirect::to(landing_path(output.role)).into_response())
}

// ============================================================================
// Logout
// ============================================================================

/// POST /auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<LogoutForm>,
) -> AuthResult<Redirect>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let manager = state.session_manager();
    require_csrf(&manager, &ctx, &headers, form.csrf_token.as_deref()).await?;

    manager.logout(&ctx).await;

    Ok(Redirect::to(LOGIN_PATH))
}

// ============================================================================
// Register
// ============================================================================

/// POST /auth/register
pub async fn register<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> AuthResult<(StatusCode, Json<RegisterResponse>)>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    require_csrf(
        &state.session_manager(),
        &ctx,
        &headers,
        form.csrf_token.as_deref(),
    )
    .await?;

    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let input = RegisterInput {
        email: form.email,
        name: form.name,
        password: form.password,
    };

    let user_id = use_case.execute(input, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user_id.to_string(),
        }),
    ))
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /auth/session
pub async fn session_status<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
) -> Json<SessionStatusResponse>
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let manager = state.session_manager();

    if !manager.is_logged_in(&ctx).await {
        return Json(SessionStatusResponse::anonymous());
    }

    let Some(user) = manager.current_user(&ctx).await else {
        return Json(SessionStatusResponse::anonymous());
    };

    let expires_at = user
        .login_time
        .checked_add_signed(state.config.session_lifetime_chrono());

    Json(SessionStatusResponse {
        authenticated: true,
        user_id: Some(user.user_id.to_string()),
        name: Some(user.name),
        email: Some(user.email.as_str().to_string()),
        role: user.role.map(|r| r.code().to_string()),
        login_time: Some(user.login_time),
        expires_at,
    })
}
