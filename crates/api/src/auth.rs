//! Authenticated-user extractor.
//!
//! Identity verification is the job of the upstream identity
//! collaborator; by the time a request reaches this service its bearer
//! credential has been resolved to a user identity, which this
//! extractor reads. Requests with no usable credential are rejected
//! before any handler runs.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        let user_id = token
            .parse::<Uuid>()
            .map_err(|_| ApiError::Unauthenticated)?;

        Ok(AuthUser(UserId::from_uuid(user_id)))
    }
}
