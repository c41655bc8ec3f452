//! User registration with one-time-code issuance.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, instrument};

use crate::api::email::{self, EmailSender};

use super::password::hash_password;
use super::principal::server_error;
use super::state::AuthState;
use super::storage::{insert_user_with_otp, RegisterOutcome};
use super::types::{ApiMessage, RegisterRequest, RegisterResponse};
use super::utils::{generate_otp, normalize_email, valid_email};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, code emailed", body = RegisterResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ApiMessage),
        (status = 500, description = "Registration failed", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    let full_name = request.full_name.trim().to_string();
    if full_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Full name is required")),
        )
            .into_response();
    }

    let email_addr = normalize_email(&request.email);
    if email_addr.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Email is required")),
        )
            .into_response();
    }
    if !valid_email(&email_addr) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Invalid email address")),
        )
            .into_response();
    }

    if request.password.len() < 6 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Password must be at least 6 characters")),
        )
            .into_response();
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err:#}");
            return server_error();
        }
    };

    let code = generate_otp();
    let ttl = auth_state.config().otp_ttl_seconds();

    let outcome =
        match insert_user_with_otp(&pool, &full_name, &email_addr, &password_hash, &code, ttl)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("Failed to register user: {err:#}");
                return server_error();
            }
        };

    match outcome {
        RegisterOutcome::Conflict => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Email is already registered")),
        )
            .into_response(),
        RegisterOutcome::Created(user_id) => {
            // Fire-and-forget: a failed send never rolls back the account.
            email::dispatch(&sender, email::otp_email(&email_addr, &code, ttl));

            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    success: true,
                    message: "Registration successful, check your email for the verification code"
                        .to_string(),
                    user_id: user_id.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use anyhow::Result;
    use axum::response::IntoResponse;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(super::super::AuthConfig::new(
            SecretString::from("unit-test-secret".to_string()),
            "http://localhost:3000".to_string(),
        )))
    }

    fn sender() -> Arc<dyn EmailSender> {
        Arc::new(LogEmailSender)
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    async fn register_with(payload: Option<RegisterRequest>) -> axum::response::Response {
        register(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Extension(sender()),
            payload.map(Json),
        )
        .await
        .into_response()
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register_with(None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_blank_full_name() -> Result<()> {
        let response = register_with(Some(RegisterRequest {
            full_name: "   ".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret1".to_string(),
        }))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() -> Result<()> {
        let response = register_with(Some(RegisterRequest {
            full_name: "Jane Doe".to_string(),
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        }))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_short_password() -> Result<()> {
        let response = register_with(Some(RegisterRequest {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            password: "12345".to_string(),
        }))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
