//! Domain Services

pub mod lockout;
