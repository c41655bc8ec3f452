//! Auth configuration shared across handlers.

use secrecy::SecretString;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_OTP_TTL_SECONDS: i64 = 3 * 60;

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    frontend_base_url: String,
    session_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    otp_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            jwt_secret,
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            otp_ttl_seconds: DEFAULT_OTP_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, ttl: i64) -> Self {
        self.session_ttl_seconds = ttl;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, ttl: i64) -> Self {
        self.reset_token_ttl_seconds = ttl;
        self
    }

    #[must_use]
    pub fn with_otp_ttl_seconds(mut self, ttl: i64) -> Self {
        self.otp_ttl_seconds = ttl;
        self
    }

    pub(crate) fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    pub(crate) fn otp_ttl_seconds(&self) -> i64 {
        self.otp_ttl_seconds
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("reset_token_ttl_seconds", &self.reset_token_ttl_seconds)
            .field("otp_ttl_seconds", &self.otp_ttl_seconds)
            .finish()
    }
}

#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("unit-test-secret".to_string()),
            "https://app.lernejo.dev".to_string(),
        )
    }

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = config();

        assert_eq!(config.frontend_base_url(), "https://app.lernejo.dev");
        assert_eq!(config.session_ttl_seconds(), DEFAULT_SESSION_TTL_SECONDS);
        assert_eq!(
            config.reset_token_ttl_seconds(),
            DEFAULT_RESET_TOKEN_TTL_SECONDS
        );
        assert_eq!(config.otp_ttl_seconds(), DEFAULT_OTP_TTL_SECONDS);

        let config = config
            .with_session_ttl_seconds(3600)
            .with_reset_token_ttl_seconds(300)
            .with_otp_ttl_seconds(60);

        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.reset_token_ttl_seconds(), 300);
        assert_eq!(config.otp_ttl_seconds(), 60);
    }

    #[test]
    fn debug_redacts_jwt_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("unit-test-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn auth_state_exposes_config() {
        let state = AuthState::new(config());
        assert_eq!(state.config().frontend_base_url(), "https://app.lernejo.dev");
    }
}
