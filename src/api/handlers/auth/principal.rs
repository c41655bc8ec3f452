//! Authenticated principal extraction and role gating.
//!
//! Flow Overview: read the bearer token, verify its signature and expiry,
//! resolve the embedded user id to a live account, and reject blocked
//! accounts before the handler runs.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use tracing::error;

use super::state::AuthState;
use super::storage::{self, UserRecord};
use super::token::{self, TokenError, TokenPurpose};
use super::types::{ApiMessage, Role};
use super::utils::extract_bearer_token;

/// Resolve the request to a live, unblocked account or an error response.
///
/// # Errors
///
/// 401 for a missing/invalid/expired token or a vanished account (the three
/// token failures carry distinguishable messages), 403 for blocked accounts,
/// 500 when the lookup itself fails.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<UserRecord, Response> {
    let Some(token_value) = extract_bearer_token(headers) else {
        return Err(unauthorized("Missing authorization token"));
    };

    let claims = token::verify(
        state.config().jwt_secret(),
        &token_value,
        TokenPurpose::Session,
    )
    .map_err(|err| match err {
        TokenError::Expired => unauthorized("Token has expired"),
        TokenError::Invalid => unauthorized("Invalid token"),
    })?;

    let user = match storage::lookup_user_by_id(pool, claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(unauthorized("Account no longer exists")),
        Err(err) => {
            error!("Failed to resolve authenticated user: {err:#}");
            return Err(server_error());
        }
    };

    if user.blocked {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiMessage::err("Account is blocked")),
        )
            .into_response());
    }

    Ok(user)
}

/// Reject principals whose role is not in the allowed set.
///
/// # Errors
///
/// 403 with an envelope body on role mismatch.
pub(crate) fn require_role(user: &UserRecord, allowed: &[Role]) -> Result<(), Response> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiMessage::err("Insufficient role")),
        )
            .into_response())
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiMessage::err(message))).into_response()
}

pub(super) fn server_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiMessage::err("Internal server error")),
    )
        .into_response()
}
