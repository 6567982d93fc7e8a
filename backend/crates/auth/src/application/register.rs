//! Registration Use Case
//!
//! Creates a customer account. Does not sign the new user in.

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;
use kernel::id::UserId;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::CredentialRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

const NAME_MAX_CHARS: usize = 100;

/// Registration input
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

pub struct RegisterUseCase<C>
where
    C: CredentialRepository,
{
    credentials: Arc<C>,
    config: Arc<AuthConfig>,
}

impl<C> RegisterUseCase<C>
where
    C: CredentialRepository,
{
    pub fn new(credentials: Arc<C>, config: Arc<AuthConfig>) -> Self {
        Self {
            credentials,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput, now: DateTime<Utc>) -> AuthResult<UserId> {
        let email = Email::new(&input.email)?;
        let name = validate_name(&input.name)?;
        let raw = RawPassword::new(input.password)?;

        // Cheap pre-check; the unique index still decides under a race
        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw, self.config.pepper())?;
        let user = User::new(email, name, password_hash, now);

        self.credentials.create(&user).await?;

        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(user.user_id)
    }
}

fn validate_name(raw: &str) -> AuthResult<String> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(AuthError::Validation(AppError::bad_request(
            "Name cannot be empty",
        )));
    }

    if name.chars().count() > NAME_MAX_CHARS || name.chars().any(char::is_control) {
        return Err(AuthError::Validation(AppError::bad_request(format!(
            "Name must be at most {} printable characters",
            NAME_MAX_CHARS
        ))));
    }

    Ok(name.to_string())
}
