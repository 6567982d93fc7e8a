//! Storefront authentication and session core
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, lockout rules, repository traits
//! - `application/` - Session manager, lockout guard, sign-in and registration
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - Session middleware, extractors, handlers, router
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B style policy)
//! - Server-side sessions behind an HMAC-signed cookie, id regenerated at sign-in
//! - Absolute session lifetime counted from sign-in
//! - Account lockout after consecutive failed sign-ins
//! - Per-session CSRF token on every state-changing auth endpoint
//! - Role hierarchy: Admin ⊇ Staff ⊇ Customer

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::{AuthConfig, ConfigError};
pub use application::{Outcome, SessionContext, SessionManager};
pub use domain::value_object::user_role::UserRole;
pub use error::{AccessDenied, AuthError, AuthResult};
pub use infra::{MemoryAuthRepository, PgAuthRepository};
pub use presentation::extract::{RequireAdmin, RequireCustomer, RequireLogin, RequireStaff};
pub use presentation::handlers::AuthAppState;
pub use presentation::router::storefront_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
