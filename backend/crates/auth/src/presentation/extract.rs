//! Request extractors
//!
//! `SessionContext` comes from the session middleware. The `Require*`
//! extractors turn a failed login or role check into the redirect, so a
//! protected handler cannot run without passing it.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use std::marker::PhantomData;

use crate::application::session_context::SessionContext;
use crate::domain::entity::session::SessionUser;
use crate::domain::value_object::user_role::UserRole;
use crate::error::AuthError;

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| AuthError::Internal("session middleware is not installed".to_string()))
    }
}

/// Any signed-in user. Rejects with 302 to `/login`.
///
/// ```ignore
/// async fn account(RequireLogin(user): RequireLogin) -> String {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireLogin(pub SessionUser);

impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        ctx.require_login()
            .await
            .map(RequireLogin)
            .map_err(IntoResponse::into_response)
    }
}

/// Minimum role for a `RequireRole` extractor
pub trait RoleRequirement {
    const ROLE: UserRole;
}

pub struct CustomerRole;
pub struct StaffRole;
pub struct AdminRole;

impl RoleRequirement for CustomerRole {
    const ROLE: UserRole = UserRole::Customer;
}

impl RoleRequirement for StaffRole {
    const ROLE: UserRole = UserRole::Staff;
}

impl RoleRequirement for AdminRole {
    const ROLE: UserRole = UserRole::Admin;
}

/// Signed-in user holding at least `R::ROLE`
///
/// Not signed in: 302 to `/login`. Signed in with a lower role: 302 to `/403`.
pub struct RequireRole<R: RoleRequirement> {
    pub user: SessionUser,
    _role: PhantomData<fn() -> R>,
}

impl<R: RoleRequirement> RequireRole<R> {
    pub fn into_user(self) -> SessionUser {
        self.user
    }
}

pub type RequireCustomer = RequireRole<CustomerRole>;
pub type RequireStaff = RequireRole<StaffRole>;
pub type RequireAdmin = RequireRole<AdminRole>;

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let user = ctx
            .require_role(R::ROLE)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(Self {
            user,
            _role: PhantomData,
        })
    }
}
