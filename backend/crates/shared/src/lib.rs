//! Shared Kernel
//!
//! The small vocabulary every storefront crate agrees on:
//! - the unified [`error::app_error::AppError`] and its HTTP classification
//! - typed UUID identifiers
//!
//! Anything domain specific (users, sessions, roles) lives in `auth`.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
