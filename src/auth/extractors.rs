use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::{api_error, ApiError};

/// Account id of a request carrying `Authorization: Bearer <access token>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Unauthorized"))?;

        let token = raw
            .strip_prefix("Bearer ")
            .or_else(|| raw.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("Invalid Authorization header"))?;

        let claims = JwtKeys::from_ref(state).verify_access(token).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            unauthorized("Invalid Token")
        })?;

        Ok(AuthUser(claims.sub))
    }
}

fn unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, message)
}
