use axum::{extract::FromRequestParts, http::request::Parts};
use compute::{AccessError, Identity};
use tracing::debug;
use uuid::Uuid;

use crate::helpers::errors::ApiError;
use crate::schemas::AppState;

/// Header carrying the id of the user authenticated upstream.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// The caller, resolved against the user table on every request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AccessError::Unauthorized)?;

        let identity = Identity::resolve(&state.store, user_id).await?;
        debug!(%user_id, role = ?identity.role, "Resolved caller");

        Ok(CurrentUser(identity))
    }
}
