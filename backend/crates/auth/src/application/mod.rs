//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod lockout_guard;
pub mod outcome;
pub mod register;
pub mod session_context;
pub mod session_manager;
pub mod sign_in;

// Re-exports
pub use config::{AuthConfig, ConfigError};
pub use lockout_guard::LockoutGuard;
pub use outcome::{Degradation, Outcome};
pub use register::{RegisterInput, RegisterUseCase};
pub use session_context::{SessionChange, SessionContext};
pub use session_manager::{CookieDirective, SessionManager, TimeoutCheck};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
