//! Application Configuration
//!
//! Configuration for the Auth application layer.

use base64::{Engine, engine::general_purpose::STANDARD};
use std::time::Duration;
use thiserror::Error;

use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::domain::service::lockout::LockoutPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is required")]
    Missing { key: &'static str },

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Absolute session lifetime, counted from sign-in
    pub session_lifetime: Duration,
    /// Consecutive failures before the account locks
    pub max_login_attempts: u32,
    pub lockout_duration: Duration,
    /// Random bytes per CSRF token
    pub csrf_token_length: usize,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    pub cookie_domain: Option<String>,
    pub cookie_path: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Treat the account as locked when `LockoutGuard::is_account_locked`
    /// cannot read the store. Sign-in checks the record it already fetched
    /// and is not affected.
    pub lockout_fail_closed: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "storefront_session".to_string(),
            session_secret: [0u8; 32],
            session_lifetime: Duration::from_secs(86_400),
            max_login_attempts: 5,
            lockout_duration: Duration::from_secs(30 * 60),
            csrf_token_length: 32,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            cookie_domain: None,
            cookie_path: "/".to_string(),
            password_pepper: None,
            lockout_fail_closed: false,
        }
    }
}

impl AuthConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults except
    /// `SESSION_SECRET`, which is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let secret = lookup("SESSION_SECRET").ok_or(ConfigError::Missing {
            key: "SESSION_SECRET",
        })?;
        let session_secret = decode_secret(&secret)?;

        let max_login_attempts = parse_or(&lookup, "MAX_LOGIN_ATTEMPTS", defaults.max_login_attempts)?;
        if max_login_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_LOGIN_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let csrf_token_length = parse_or(&lookup, "CSRF_TOKEN_LENGTH", defaults.csrf_token_length)?;
        if csrf_token_length < 16 {
            return Err(ConfigError::Invalid {
                key: "CSRF_TOKEN_LENGTH",
                reason: "must be at least 16 bytes".to_string(),
            });
        }

        let cookie_same_site = match lookup("COOKIE_SAME_SITE") {
            Some(v) => SameSite::parse(&v).ok_or_else(|| ConfigError::Invalid {
                key: "COOKIE_SAME_SITE",
                reason: format!("expected Strict, Lax or None, got {v:?}"),
            })?,
            None => defaults.cookie_same_site,
        };

        Ok(Self {
            session_cookie_name: lookup("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            session_secret,
            session_lifetime: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_LIFETIME_SECS",
                defaults.session_lifetime.as_secs(),
            )?),
            max_login_attempts,
            lockout_duration: Duration::from_secs(parse_or(
                &lookup,
                "LOCKOUT_DURATION_SECS",
                defaults.lockout_duration.as_secs(),
            )?),
            csrf_token_length,
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
            cookie_same_site,
            cookie_domain: lookup("COOKIE_DOMAIN").filter(|d| !d.trim().is_empty()),
            cookie_path: lookup("COOKIE_PATH").unwrap_or(defaults.cookie_path),
            password_pepper: lookup("PASSWORD_PEPPER")
                .filter(|p| !p.is_empty())
                .map(String::into_bytes),
            lockout_fail_closed: parse_or(
                &lookup,
                "LOCKOUT_FAIL_CLOSED",
                defaults.lockout_fail_closed,
            )?,
        })
    }

    /// Session lifetime as a chrono duration, for timestamp arithmetic
    pub fn session_lifetime_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_lifetime).unwrap_or(chrono::Duration::MAX)
    }

    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy::new(
            self.max_login_attempts,
            chrono::Duration::from_std(self.lockout_duration).unwrap_or(chrono::Duration::MAX),
        )
    }

    /// Scope attributes shared by the issuing and the expiring `Set-Cookie`
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: self.cookie_path.clone(),
            domain: self.cookie_domain.clone(),
            max_age_secs: i64::try_from(self.session_lifetime.as_secs()).ok(),
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn decode_secret(value: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = STANDARD
        .decode(value.trim())
        .map_err(|e| ConfigError::Invalid {
            key: "SESSION_SECRET",
            reason: e.to_string(),
        })?;

    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| ConfigError::Invalid {
        key: "SESSION_SECRET",
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
