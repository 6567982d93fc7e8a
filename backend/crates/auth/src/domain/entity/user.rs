//! User Entity
//!
//! A storefront account: identity, role, credentials and sign-in
//! bookkeeping live on one row.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::service::lockout::LoginState;
use crate::domain::value_object::{email::Email, user_password::UserPassword, user_role::UserRole};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    /// Display name shown in the storefront header
    pub name: String,
    pub role: UserRole,
    pub password_hash: UserPassword,
    pub login_state: LoginState,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New customer account
    pub fn new(email: Email, name: String, password_hash: UserPassword, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            name,
            role: UserRole::Customer,
            password_hash,
            login_state: LoginState::default(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    #[test]
    fn test_new_user_is_customer() {
        let raw = RawPassword::new("Gramophone1925!".to_string()).unwrap();
        let user = User::new(
            Email::new("buyer@example.com").unwrap(),
            "Buyer".to_string(),
            UserPassword::from_raw(&raw, None).unwrap(),
            Utc::now(),
        );

        assert_eq!(user.role, UserRole::Customer);
        assert_eq!(user.login_state, LoginState::cleared());
        assert!(user.last_login_at.is_none());
        assert_eq!(user.with_role(UserRole::Staff).role, UserRole::Staff);
    }
}
