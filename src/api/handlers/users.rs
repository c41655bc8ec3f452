//! Administrative user management endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via bearer token.
//! 2) Enforce the admin role.
//! 3) List accounts or drive the block/unblock transition - the only writers
//!    of the `blocked` flag.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

use super::auth::{
    principal::{require_auth, require_role},
    storage,
    types::{ApiMessage, Role, UserListResponse, UserResponse},
    AuthState,
};

async fn require_admin(
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
) -> Result<(), Response> {
    let principal = require_auth(headers, pool, auth_state).await?;
    require_role(&principal, &[Role::Admin])
}

#[utoipa::path(
    get,
    path = "/v1/admin/users",
    responses(
        (status = 200, description = "All accounts, newest first", body = UserListResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
        (status = 403, description = "Not an administrator", body = ApiMessage)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&headers, &pool, &auth_state).await {
        return response;
    }

    match storage::list_users(&pool).await {
        Ok(users) => (
            StatusCode::OK,
            Json(UserListResponse {
                success: true,
                users: users.iter().map(UserResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to list users: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::err("Internal server error")),
            )
                .into_response()
        }
    }
}

async fn set_blocked(
    id: &str,
    headers: &HeaderMap,
    pool: &PgPool,
    auth_state: &AuthState,
    blocked: bool,
) -> Response {
    if let Err(response) = require_admin(headers, pool, auth_state).await {
        return response;
    }

    let Ok(user_id) = Uuid::parse_str(id.trim()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Invalid user id")),
        )
            .into_response();
    };

    match storage::set_blocked(pool, user_id, blocked).await {
        Ok(true) => {
            let message = if blocked {
                "User has been blocked"
            } else {
                "User has been unblocked"
            };
            (StatusCode::OK, Json(ApiMessage::ok(message))).into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::err("User not found")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update blocked flag: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::err("Internal server error")),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/admin/users/{id}/block",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User blocked", body = ApiMessage),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
        (status = 403, description = "Not an administrator", body = ApiMessage),
        (status = 404, description = "Unknown user id", body = ApiMessage)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn block_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    set_blocked(&id, &headers, &pool, &auth_state, true).await
}

#[utoipa::path(
    post,
    path = "/v1/admin/users/{id}/unblock",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User unblocked", body = ApiMessage),
        (status = 401, description = "Missing, invalid, or expired token", body = ApiMessage),
        (status = 403, description = "Not an administrator", body = ApiMessage),
        (status = 404, description = "Unknown user id", body = ApiMessage)
    ),
    tag = "admin"
)]
#[instrument(skip_all)]
pub async fn unblock_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    set_blocked(&id, &headers, &pool, &auth_state, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use anyhow::Result;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(AuthConfig::new(
            SecretString::from("unit-test-secret".to_string()),
            "http://localhost:3000".to_string(),
        )))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn list_users_requires_token() -> Result<()> {
        let response = list_users(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(auth_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn block_user_requires_token() -> Result<()> {
        let response = block_user(
            Path(uuid::Uuid::nil().to_string()),
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(auth_state()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
