//! Value Object Module

pub mod csrf_token;
pub mod email;
pub mod session_token;
pub mod user_password;
pub mod user_role;
