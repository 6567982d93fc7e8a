//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use extract::{
    AdminRole, CustomerRole, RequireAdmin, RequireCustomer, RequireLogin, RequireRole,
    RequireStaff, RoleRequirement, StaffRole,
};
pub use handlers::AuthAppState;
pub use middleware::session_middleware;
pub use router::{auth_routes, storefront_router, with_sessions};
