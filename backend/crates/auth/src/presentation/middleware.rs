//! Session Middleware
//!
//! Wraps every storefront route: resolves the session from the cookie,
//! enforces the session lifetime, exposes the `SessionContext` to handlers
//! and writes it back afterwards.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use platform::cookie::extract_cookie;

use crate::application::session_manager::{CookieDirective, TimeoutCheck};
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::error::{LOGIN_PATH, found};
use crate::presentation::handlers::AuthAppState;

/// Where a timed-out session is sent
pub fn timeout_location() -> String {
    format!("{}?timeout=1", LOGIN_PATH)
}

/// Install with `axum::middleware::from_fn_with_state(state, session_middleware::<R>)`
pub async fn session_middleware<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let manager = state.session_manager();
    let cookie_config = manager.cookie_config();
    let now = Utc::now();

    let cookie = extract_cookie(req.headers(), &cookie_config.name);

    let ctx = match manager.bootstrap(cookie.as_deref(), now).await {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    if manager.check_timeout(&ctx, now).await == TimeoutCheck::Expired {
        let mut response = found(&timeout_location());
        match manager.commit(&ctx, now).await {
            Ok(outcome) => append_cookie(&mut response, outcome.value(), &cookie_config),
            Err(e) => return e.into_response(),
        }
        return response;
    }

    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;

    match manager.commit(&ctx, Utc::now()).await {
        Ok(outcome) => append_cookie(&mut response, outcome.value(), &cookie_config),
        Err(e) => return e.into_response(),
    }

    response
}

fn append_cookie(
    response: &mut Response,
    directive: &CookieDirective,
    cookie_config: &platform::cookie::CookieConfig,
) {
    let Some(value) = directive.to_header_value(cookie_config) else {
        return;
    };

    match HeaderValue::from_str(&value) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => {
            tracing::error!(error = %e, "Session cookie is not a valid header value");
        }
    }
}
