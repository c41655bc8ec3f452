use anyhow::{Context, Result};
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_RESET_TOKEN_TTL_SECONDS: &str = "reset-token-ttl-seconds";
pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long("jwt-secret")
                .help("HS256 signing secret for session and reset tokens")
                .env("LERNEJO_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("LERNEJO_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_RESET_TOKEN_TTL_SECONDS)
                .long("reset-token-ttl-seconds")
                .help("Password reset token TTL in seconds")
                .env("LERNEJO_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long("otp-ttl-seconds")
                .help("Verification code TTL in seconds")
                .env("LERNEJO_OTP_TTL_SECONDS")
                .default_value("180")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long("frontend-base-url")
                .help("Frontend base URL used for reset links and CORS")
                .env("LERNEJO_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub frontend_base_url: String,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    ///
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let jwt_secret = matches
            .get_one::<String>(ARG_JWT_SECRET)
            .cloned()
            .context("missing required argument: --jwt-secret")?;

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(604_800),
            reset_token_ttl_seconds: matches
                .get_one::<i64>(ARG_RESET_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(3600),
            otp_ttl_seconds: matches
                .get_one::<i64>(ARG_OTP_TTL_SECONDS)
                .copied()
                .unwrap_or(180),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parse_defaults() -> Result<()> {
        temp_env::with_vars(
            [
                ("LERNEJO_SESSION_TTL_SECONDS", None::<&str>),
                ("LERNEJO_RESET_TOKEN_TTL_SECONDS", None::<&str>),
                ("LERNEJO_OTP_TTL_SECONDS", None::<&str>),
                ("LERNEJO_FRONTEND_BASE_URL", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "lernejo",
                    "--dsn",
                    "postgres://localhost/lernejo",
                    "--jwt-secret",
                    "secret",
                ]);
                let options = Options::parse(&matches)?;
                assert_eq!(options.jwt_secret.expose_secret(), "secret");
                assert_eq!(options.session_ttl_seconds, 604_800);
                assert_eq!(options.reset_token_ttl_seconds, 3600);
                assert_eq!(options.otp_ttl_seconds, 180);
                assert_eq!(options.frontend_base_url, "http://localhost:3000");
                Ok(())
            },
        )
    }

    #[test]
    fn parse_overrides() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "lernejo",
            "--dsn",
            "postgres://localhost/lernejo",
            "--jwt-secret",
            "secret",
            "--session-ttl-seconds",
            "3600",
            "--reset-token-ttl-seconds",
            "120",
            "--otp-ttl-seconds",
            "60",
            "--frontend-base-url",
            "https://app.lernejo.dev",
        ]);
        let options = Options::parse(&matches)?;
        assert_eq!(options.session_ttl_seconds, 3600);
        assert_eq!(options.reset_token_ttl_seconds, 120);
        assert_eq!(options.otp_ttl_seconds, 60);
        assert_eq!(options.frontend_base_url, "https://app.lernejo.dev");
        Ok(())
    }
}
