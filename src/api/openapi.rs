use super::handlers::{auth, health, users};
use utoipa::openapi::{InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec. Routes added outside (like
/// `/` and the Swagger UI) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::verification::verify_otp))
        .routes(routes!(auth::verification::resend_otp))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::login::admin_login))
        .routes(routes!(auth::password_reset::forgot_password))
        .routes(routes!(auth::password_reset::reset_password))
        .routes(routes!(auth::account::verify_user))
        .routes(routes!(auth::account::delete_account))
        .routes(routes!(users::list_users))
        .routes(routes!(users::block_user))
        .routes(routes!(users::unblock_user));

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, OTP verification and login".to_string());

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Administrative user management".to_string());

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service health".to_string());

    router.get_openapi_mut().tags = Some(vec![auth_tag, admin_tag, health_tag]);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.license = Some(License::new(env!("CARGO_PKG_LICENSE")));

    OpenApiBuilder::new().info(info).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "admin"));

        for path in [
            "/v1/auth/register",
            "/v1/auth/verify-otp",
            "/v1/auth/resend-otp",
            "/v1/auth/login",
            "/v1/auth/admin-login",
            "/v1/auth/forgot-password",
            "/v1/auth/reset-password/{token}",
            "/v1/auth/verify-user",
            "/v1/auth/delete-account/{userId}",
            "/v1/admin/users",
            "/v1/admin/users/{id}/block",
            "/v1/admin/users/{id}/unblock",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing OpenAPI path: {path}"
            );
        }
    }
}
