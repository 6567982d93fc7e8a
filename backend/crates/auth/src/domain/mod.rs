//! Domain Layer
//!
//! Contains entities, value objects, domain services and repository traits.

pub mod entity;
pub mod repository;
pub mod service;
pub mod value_object;

// Re-exports
pub use entity::{session::Session, user::User};
pub use repository::{CredentialRepository, SessionRepository};
