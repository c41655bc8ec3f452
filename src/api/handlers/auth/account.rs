//! Authenticated account endpoints: token introspection and deletion.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use super::principal::{require_auth, require_role, server_error};
use super::state::AuthState;
use super::storage::delete_user;
use super::types::{ApiMessage, Role, UserResponse, VerifyUserResponse};

#[utoipa::path(
    get,
    path = "/v1/auth/verify-user",
    responses(
        (status = 200, description = "Token resolves to a live account", body = VerifyUserResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
        (status = 403, description = "Account is blocked", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let user = match require_auth(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        Json(VerifyUserResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    )
        .into_response()
}

#[utoipa::path(
    delete,
    path = "/v1/auth/delete-account/{userId}",
    params(
        ("userId" = String, Path, description = "Account id to delete")
    ),
    responses(
        (status = 200, description = "Account and owned records deleted", body = ApiMessage),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
        (status = 403, description = "Blocked account or wrong role", body = ApiMessage),
        (status = 404, description = "Account already absent", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn delete_account(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Err(response) = require_role(&principal, &[Role::User]) {
        return response;
    }

    let Ok(target_id) = Uuid::parse_str(user_id.trim()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Invalid user id")),
        )
            .into_response();
    };

    // Deleting an already-absent id reports not-found instead of silently
    // succeeding; owned records disappear with the account via cascade.
    match delete_user(&pool, target_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiMessage::ok("Account has been deleted")),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::err("User not found")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to delete account: {err:#}");
            server_error()
        }
    }
}
