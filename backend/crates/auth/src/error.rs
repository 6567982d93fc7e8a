//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// The only message a failed sign-in ever shows
pub const AUTH_FAILURE_MESSAGE: &str = "Invalid email or password";

const TRY_AGAIN_MESSAGE: &str = "Please try again later";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts
    #[error("Account is temporarily locked")]
    AccountLocked,

    #[error("Email is already registered")]
    EmailTaken,

    /// Missing or mismatched CSRF token on a state-changing request
    #[error("CSRF token missing or invalid")]
    CsrfMismatch,

    /// Client-side validation failure (email format, password policy, ...)
    #[error("{0}")]
    Validation(AppError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Client-caused database errors keep their kind; the rest become 503
fn database_kind(err: &sqlx::Error) -> ErrorKind {
    let kind = AppError::classify_sqlx(err).kind();
    if kind.is_server_error() {
        ErrorKind::ServiceUnavailable
    } else {
        kind
    }
}

impl AuthError {
    /// HTTP status, always the one `into_app_error` responds with
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials | AuthError::AccountLocked => ErrorKind::Unauthorized,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::CsrfMismatch => ErrorKind::Forbidden,
            AuthError::Validation(e) => e.kind(),
            AuthError::Database(e) => database_kind(e),
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Both sign-in failures look identical to the client
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::AccountLocked)
    }

    /// Store errors are the only ones worth retrying later
    pub fn is_persistence(&self) -> bool {
        matches!(self, AuthError::Database(_))
    }

    /// Convert to the client-facing AppError
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::InvalidCredentials | AuthError::AccountLocked => {
                AppError::unauthorized(AUTH_FAILURE_MESSAGE)
            }
            AuthError::EmailTaken => AppError::conflict("Email is already registered")
                .with_action("Sign in instead, or use another email address"),
            AuthError::CsrfMismatch => AppError::forbidden("Invalid or missing CSRF token")
                .with_action("Reload the page and submit the form again"),
            AuthError::Validation(e) => e,
            AuthError::Database(e) => {
                if database_kind(&e).is_server_error() {
                    AppError::service_unavailable(TRY_AGAIN_MESSAGE)
                        .with_action("Reload the page in a moment")
                } else {
                    AppError::from(e)
                }
            }
            AuthError::Internal(_) => AppError::internal("Internal server error"),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::CsrfMismatch => {
                tracing::warn!("CSRF token rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        if err.kind().is_client_error() {
            AuthError::Validation(err)
        } else {
            AuthError::Internal(err.to_string())
        }
    }
}

// ============================================================================
// Access control rejections
// ============================================================================

/// Where protected pages send a visitor who may not see them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No signed-in identity: 302 to the login page
    LoginRequired,
    /// Signed in, but the role is insufficient: 302 to the forbidden page
    Forbidden,
}

pub const LOGIN_PATH: &str = "/login";
pub const FORBIDDEN_PATH: &str = "/403";

impl AccessDenied {
    pub fn location(&self) -> &'static str {
        match self {
            AccessDenied::LoginRequired => LOGIN_PATH,
            AccessDenied::Forbidden => FORBIDDEN_PATH,
        }
    }
}

/// Plain 302 redirect with no body
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(axum::http::header::LOCATION, location)]).into_response()
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        tracing::debug!(location = self.location(), "Access denied");
        found(self.location())
    }
}
