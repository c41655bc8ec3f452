//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the API server with its full configuration state.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, smtp};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
///
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    // Reject an SMTP host without the credential trio
    crate::cli::commands::validate(matches).map_err(|e| anyhow::anyhow!(e))?;

    let auth_opts = auth::Options::parse(matches)?;
    let smtp_opts = smtp::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        reset_token_ttl_seconds: auth_opts.reset_token_ttl_seconds,
        otp_ttl_seconds: auth_opts.otp_ttl_seconds,
        frontend_base_url: auth_opts.frontend_base_url,
        smtp: smtp_opts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn maps_matches_to_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("LERNEJO_SMTP_HOST", None::<&str>),
                ("LERNEJO_PORT", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "lernejo",
                    "--port",
                    "9000",
                    "--dsn",
                    "postgres://user@localhost:5432/lernejo",
                    "--jwt-secret",
                    "secret",
                ]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 9000);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/lernejo");
                assert_eq!(args.session_ttl_seconds, 604_800);
                assert!(args.smtp.host.is_none());
                Ok(())
            },
        )
    }

    #[test]
    fn rejects_smtp_host_without_credentials() {
        temp_env::with_vars(
            [
                ("LERNEJO_SMTP_USERNAME", None::<&str>),
                ("LERNEJO_SMTP_PASSWORD", None::<&str>),
                ("LERNEJO_SMTP_FROM", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "lernejo",
                    "--dsn",
                    "postgres://user@localhost:5432/lernejo",
                    "--jwt-secret",
                    "secret",
                    "--smtp-host",
                    "smtp.example.com",
                ]);
                let result = handler(&matches);
                assert!(result.is_err());
            },
        );
    }
}
