//! One-time-code verification and resend endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::api::email::{self, EmailSender};

use super::principal::server_error;
use super::state::AuthState;
use super::storage::{consume_otp, lookup_user_by_email, replace_otp, sweep_expired_otps};
use super::types::{ApiMessage, ResendOtpRequest, VerifyOtpRequest};
use super::utils::{generate_otp, normalize_email};

#[utoipa::path(
    post,
    path = "/v1/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiMessage),
        (status = 400, description = "Invalid or expired code", body = ApiMessage),
        (status = 404, description = "Unknown email", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_otp(
    pool: Extension<PgPool>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Missing payload")),
        )
            .into_response();
    };

    let email_addr = normalize_email(&request.email);
    let code = request.otp.trim();
    if email_addr.is_empty() || code.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Email and OTP are required")),
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
            error!("Failed to lookup user for verification: {err:#}");
            return server_error();
        }
    };

    // Housekeeping only; consume_otp re-checks the expiry itself.
    match sweep_expired_otps(&pool).await {
        Ok(swept) if swept > 0 => debug!("swept {swept} expired codes"),
        Ok(_) => {}
        Err(err) => error!("Failed to sweep expired codes: {err:#}"),
    }

    match consume_otp(&pool, user.id, code).await {
        Ok(true) => {
            email::dispatch(&sender, email::welcome_email(&user.email, &user.full_name));

            (
                StatusCode::OK,
                Json(ApiMessage::ok("Email verified successfully")),
            )
                .into_response()
        }
        // Wrong code and expired code are deliberately indistinguishable.
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Invalid or expired OTP")),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to verify code: {err:#}");
            server_error()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "New code issued and emailed", body = ApiMessage),
        (status = 400, description = "Account already verified", body = ApiMessage),
        (status = 404, description = "Unknown email", body = ApiMessage)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn resend_otp(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<ResendOtpRequest>>,
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
            error!("Failed to lookup user for resend: {err:#}");
            return server_error();
        }
    };

    if user.verified {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::err("Account is already verified")),
        )
            .into_response();
    }

    let code = generate_otp();
    let ttl = auth_state.config().otp_ttl_seconds();

    // Prior codes stop verifying the moment this commits.
    if let Err(err) = replace_otp(&pool, user.id, &code, ttl).await {
        error!("Failed to replace code: {err:#}");
        return server_error();
    }

    email::dispatch(&sender, email::otp_email(&user.email, &code, ttl));

    (
        StatusCode::OK,
        Json(ApiMessage::ok("A new verification code has been sent")),
    )
        .into_response()
}
