//! Password login and session token issuance.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use super::password::verify_password;
use super::principal::server_error;
use super::state::AuthState;
use super::storage::{lookup_user_by_email, UserRecord};
use super::token::{self, TokenPurpose};
use super::types::{ApiMessage, LoginRequest, LoginResponse, Role, UserResponse};
use super::utils::normalize_email;

/// Single message for unknown email and wrong password, so the endpoint does
/// not reveal which accounts exist.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Shared credential check for login and admin login.
///
/// Check order is observable behavior: lookup, blocked, verified, password.
/// A blocked account fails with its own message even when the password would
/// not have matched.
async fn authenticate(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<UserRecord, Response> {
    let email_addr = normalize_email(email);

    let user = match lookup_user_by_email(pool, &email_addr).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiMessage::err(INVALID_CREDENTIALS)),
            )
                .into_response());
        }
        Err(err) => {
            error!("Failed to lookup user for login: {err:#}");
            return Err(server_error());
        }
    };

    if user.blocked {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Account is blocked, contact support")),
        )
            .into_response());
    }

    if !user.verified {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::err("Account is not verified")),
        )
            .into_response());
    }

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::err(INVALID_CREDENTIALS)),
        )
            .into_response()),
        Err(err) => {
            error!("Failed to verify password: {err:#}");
            Err(server_error())
        }
    }
}

fn session_response(auth_state: &AuthState, user: &UserRecord) -> Response {
    let token = match token::issue(
        auth_state.config().jwt_secret(),
        user.id,
        TokenPurpose::Session,
        auth_state.config().session_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {err:#}");
            return server_error();
        }
    };

    (
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            user: UserResponse::from(user),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Account blocked", body = ApiMessage),
        (status = 401, description = "Invalid credentials or unverified account", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    match authenticate(&pool, &request.email, &request.password).await {
        Ok(user) => session_response(&auth_state, &user),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/admin-login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Account blocked or not an administrator", body = ApiMessage),
        (status = 401, description = "Invalid credentials or unverified account", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn admin_login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    let user = match authenticate(&pool, &request.email, &request.password).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if user.role != Role::Admin {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Access denied: administrator account required")),
        )
            .into_response();
    }

    session_response(&auth_state, &user)
}
