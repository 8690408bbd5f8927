//! Request extractors.
//!
//! Identity is issued upstream: the gateway in front of this service sets
//! `x-user-id` (and optionally `x-user-name`) on every request.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::domain::{DisplayName, UserId, UserIdentity};

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// `axum::Json` with rejections rendered as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with rejections rendered as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The caller of an HTTP request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserIdentity);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthenticated("missing x-user-id header"))?;
        let display_name = header(USER_NAME_HEADER).unwrap_or_else(|| user_id.clone());

        Ok(Self(identity_from(user_id, display_name)?))
    }
}

/// Build an identity, falling back to the id when the display name is unusable.
pub fn identity_from(user_id: String, display_name: String) -> Result<UserIdentity, ApiError> {
    let user_id = UserId::new(user_id)?;
    let display_name = DisplayName::new(display_name)
        .or_else(|_| DisplayName::new(user_id.to_string()))?;
    Ok(UserIdentity::new(user_id, display_name))
}
