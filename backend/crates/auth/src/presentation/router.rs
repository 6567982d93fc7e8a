//! Auth Router

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::session_middleware;

/// `/auth/*` endpoints; nest under `/auth` and wrap with [`with_sessions`]
pub fn auth_routes<R>(state: AuthAppState<R>) -> Router
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/csrf", get(handlers::csrf_token::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/register", post(handlers::register::<R>))
        .route("/session", get(handlers::session_status::<R>))
        .with_state(state)
}

/// Run the session middleware in front of every route of `router`
pub fn with_sessions<R>(router: Router, state: AuthAppState<R>) -> Router
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(state, session_middleware::<R>))
}

/// Auth endpoints plus the site's pages, all behind the session middleware
pub fn storefront_router<R>(state: AuthAppState<R>, pages: Router) -> Router
where
    R: CredentialRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let router = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .merge(pages);

    with_sessions(router, state)
}
