//! Actor extraction from pre-resolved identity headers.
//!
//! The thin HTTP surface does not authenticate: an upstream gateway has
//! already verified the caller and forwards `X-Tenant-Id`, `X-User-Id`,
//! `X-Role` and `X-Display-Name`. Missing or malformed headers are a 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use shared::types::{Actor, Role};

use crate::utils::error::AppError;

/// Extractor wrapper around the resolved [`Actor`].
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthorized)
}

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = header(parts, "x-tenant-id")?.to_string();
        let user_id = header(parts, "x-user-id")?.to_string();
        let role = Role::parse(header(parts, "x-role")?).ok_or(AppError::Unauthorized)?;
        let display_name = parts
            .headers
            .get("x-display-name")
            .and_then(|value| value.to_str().ok())
            .unwrap_or(user_id.as_str())
            .to_string();

        Ok(CurrentActor(Actor {
            id: user_id,
            tenant_id,
            display_name,
            role,
        }))
    }
}
