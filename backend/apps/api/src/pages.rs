//! Placeholder storefront pages
//!
//! Just enough HTML to drive the login form and to put each role level
//! behind a real route.

use askama::Template;
use askama_web::WebTemplate;
use auth::domain::repository::{CredentialRepository, SessionRepository};
use auth::{AuthAppState, RequireAdmin, RequireCustomer, RequireStaff, SessionContext};
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use kernel::error::app_error::AppError;
use serde::Deserialize;

pub fn router<R>(state: AuthAppState<R>) -> Router
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page::<R>))
        .route("/403", get(forbidden))
        .route("/account", get(account))
        .route("/staff/orders", get(staff_orders))
        .route("/admin", get(admin))
        .fallback(not_found)
        .with_state(state)
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate;

/// Login form; `csrf_token` goes into the hidden field
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub csrf_token: String,
    pub timed_out: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "staff_orders.html")]
pub struct StaffOrdersTemplate {
    pub name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub name: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn home() -> HomeTemplate {
    HomeTemplate
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    timeout: Option<u8>,
}

/// GET /login; also issues the form's CSRF token
async fn login_page<R>(
    State(state): State<AuthAppState<R>>,
    ctx: SessionContext,
    Query(query): Query<LoginQuery>,
) -> LoginTemplate
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let token = state.session_manager().issue_csrf(&ctx).await;

    LoginTemplate {
        csrf_token: token.as_str().to_string(),
        timed_out: query.timeout == Some(1),
    }
}

async fn forbidden() -> (StatusCode, ForbiddenTemplate) {
    (StatusCode::FORBIDDEN, ForbiddenTemplate)
}

async fn account(page: RequireCustomer) -> AccountTemplate {
    AccountTemplate {
        name: page.user.name,
    }
}

async fn staff_orders(page: RequireStaff) -> StaffOrdersTemplate {
    StaffOrdersTemplate {
        name: page.user.name,
    }
}

async fn admin(page: RequireAdmin) -> AdminTemplate {
    AdminTemplate {
        name: page.user.name,
    }
}

async fn not_found() -> AppError {
    AppError::not_found("Page not found")
}
