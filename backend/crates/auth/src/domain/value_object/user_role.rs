//! Storefront roles
//!
//! Strict hierarchy: `Admin` ⊇ `Staff` ⊇ `Customer`. A role satisfies a
//! requirement iff its rank is at least the required rank.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    Customer = 0,
    Staff = 1,
    Admin = 2,
}

impl UserRole {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Staff => "staff",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(UserRole::Customer),
            1 => Some(UserRole::Staff),
            2 => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "customer" => Some(UserRole::Customer),
            "staff" => Some(UserRole::Staff),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Does this role grant access to pages gated on `required`?
    #[inline]
    pub const fn satisfies(&self, required: UserRole) -> bool {
        self.id() >= required.id()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Role check for a possibly-absent role; absence never satisfies anything
#[inline]
pub fn has_role(role: Option<UserRole>, required: UserRole) -> bool {
    role.is_some_and(|r| r.satisfies(required))
}

/// Deserialize a role code, mapping unknown or missing codes to `None`
///
/// Stored sessions written by an older build may carry a role that no longer
/// exists; such sessions must lose access instead of failing to load.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<UserRole>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?;
    Ok(code.as_deref().and_then(UserRole::from_code))
}
