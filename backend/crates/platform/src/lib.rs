//! Platform Crate - Technical Infrastructure
//!
//! Domain-free building blocks for the storefront:
//! - Cryptographic utilities (random tokens, HMAC-SHA256, constant-time eq)
//! - Password policy and Argon2id hashing
//! - Cookie building and parsing

pub mod cookie;
pub mod crypto;
pub mod password;
