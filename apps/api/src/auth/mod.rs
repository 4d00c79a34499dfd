//! Caller identity and per-user session snapshots.
//!
//! Authentication happens upstream; this service trusts the `x-user-id`
//! header it forwards. Everything here is per-caller and therefore on the
//! response cache skip-list.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub mod handlers;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CallerId(v.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}
