//! Password reset via emailed, short-lived tokens.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::api::email::{self, EmailSender};

use super::password::hash_password;
use super::principal::server_error;
use super::state::AuthState;
use super::storage::{lookup_user_by_email, update_password};
use super::token::{self, TokenError, TokenPurpose};
use super::types::{ApiMessage, ForgotPasswordRequest, ResetPasswordRequest};
use super::utils::{build_reset_url, normalize_email};

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link emailed", body = ApiMessage),
        (status = 404, description = "Unknown email", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    let email_addr = normalize_email(&request.email);
    if email_addr.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Email is required")),
        )
            .into_response();
    }

    let user = match lookup_user_by_email(&pool, &email_addr).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiMessage::err("User not found")),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to lookup user for password reset: {err:#}");
            return server_error();
        }
    };

    let reset_token = match token::issue(
        auth_state.config().jwt_secret(),
        user.id,
        TokenPurpose::Reset,
        auth_state.config().reset_token_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue reset token: {err:#}");
            return server_error();
        }
    };

    let reset_url = build_reset_url(auth_state.config().frontend_base_url(), &reset_token);
    email::dispatch(&sender, email::reset_email(&user.email, &reset_url));

    (
        StatusCode::OK,
        Json(ApiMessage::ok("Password reset link has been sent")),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password/{token}",
    request_body = ResetPasswordRequest,
    params(
        ("token" = String, Path, description = "Reset token from the emailed link")
    ),
    responses(
        (status = 200, description = "Password replaced", body = ApiMessage),
        (status = 400, description = "Invalid or expired token", body = ApiMessage),
        (status = 404, description = "Account no longer exists", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    Path(reset_token): Path<String>,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    if request.password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Password must be at least 6 characters")),
        )
            .into_response();
    }

    // Invalid and expired are distinguishable, unlike the OTP path.
    let claims = match token::verify(
        auth_state.config().jwt_secret(),
        reset_token.trim(),
        TokenPurpose::Reset,
    ) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiMessage::err("Reset token has expired")),
            )
                .into_response();
        }
        Err(TokenError::Invalid) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiMessage::err("Invalid reset token")),
            )
                .into_response();
        }
    };

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err:#}");
            return server_error();
        }
    };

    match update_password(&pool, claims.sub, &password_hash).await {
        Ok(true) => (
            StatusCode::OK,
            Json(ApiMessage::ok("Password has been reset")),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiMessage::err("User not found")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to update password: {err:#}");
            server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(super::super::AuthConfig::new(
            SecretString::from("unit-test-secret".to_string()),
            "http://localhost:3000".to_string(),
        )))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    async fn body_text(response: axum::response::Response) -> Result<String> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    #[tokio::test]
    async fn forgot_password_missing_payload() -> Result<()> {
        let pool = lazy_pool();
        let sender: Arc<dyn EmailSender> = Arc::new(crate::api::email::LogEmailSender);
        let response = forgot_password(
            Extension(pool),
            Extension(auth_state()),
            Extension(sender),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_rejects_garbage_token() -> Result<()> {
        let response = reset_password(
            Path("garbage".to_string()),
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(ResetPasswordRequest {
                password: "secret2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await?;
        assert!(body.contains("Invalid reset token"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_distinguishes_expired_token() -> Result<()> {
        let state = auth_state();
        let expired = token::issue(
            state.config().jwt_secret(),
            Uuid::new_v4(),
            TokenPurpose::Reset,
            -120,
        )?;
        let response = reset_password(
            Path(expired),
            Extension(lazy_pool()),
            Extension(state),
            Some(Json(ResetPasswordRequest {
                password: "secret2".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await?;
        assert!(body.contains("Reset token has expired"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_password_rejects_short_password() -> Result<()> {
        let response = reset_password(
            Path("whatever".to_string()),
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(ResetPasswordRequest {
                password: "12345".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
