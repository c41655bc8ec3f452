use anyhow::Result;
use clap::{Arg, Command};
use secrecy::SecretString;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long("smtp-host")
                .help("SMTP relay host; when absent outbound email is logged only")
                .env("LERNEJO_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long("smtp-port")
                .help("SMTP relay port")
                .env("LERNEJO_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long("smtp-username")
                .help("SMTP username")
                .env("LERNEJO_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long("smtp-password")
                .help("SMTP password")
                .env("LERNEJO_SMTP_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long("smtp-from")
                .help("From address for outbound email")
                .env("LERNEJO_SMTP_FROM"),
        )
}

#[derive(Clone)]
pub struct Options {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: Option<String>,
}

impl Options {
    /// Extract SMTP options from parsed matches.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for parity with the other option
    /// groups.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            host: matches.get_one::<String>(ARG_SMTP_HOST).cloned(),
            port: matches
                .get_one::<u16>(ARG_SMTP_PORT)
                .copied()
                .unwrap_or(587),
            username: matches.get_one::<String>(ARG_SMTP_USERNAME).cloned(),
            password: matches
                .get_one::<String>(ARG_SMTP_PASSWORD)
                .cloned()
                .map(SecretString::from),
            from: matches.get_one::<String>(ARG_SMTP_FROM).cloned(),
        })
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn parse_full_options() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "lernejo",
            "--dsn",
            "postgres://localhost/lernejo",
            "--jwt-secret",
            "secret",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-port",
            "2525",
            "--smtp-username",
            "mailer",
            "--smtp-password",
            "hunter2",
            "--smtp-from",
            "Lernejo <no-reply@lernejo.dev>",
        ]);
        let options = Options::parse(&matches)?;
        assert_eq!(options.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(options.port, 2525);
        assert_eq!(options.username.as_deref(), Some("mailer"));
        assert_eq!(
            options.password.as_ref().map(ExposeSecret::expose_secret),
            Some("hunter2")
        );
        assert_eq!(options.from.as_deref(), Some("Lernejo <no-reply@lernejo.dev>"));
        Ok(())
    }

    #[test]
    fn debug_redacts_password() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "lernejo",
            "--dsn",
            "postgres://localhost/lernejo",
            "--jwt-secret",
            "secret",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-username",
            "mailer",
            "--smtp-password",
            "hunter2",
            "--smtp-from",
            "no-reply@lernejo.dev",
        ]);
        let options = Options::parse(&matches)?;
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
        Ok(())
    }

    #[test]
    fn parse_without_host() -> Result<()> {
        temp_env::with_vars(
            [
                ("LERNEJO_SMTP_HOST", None::<&str>),
                ("LERNEJO_SMTP_USERNAME", None::<&str>),
                ("LERNEJO_SMTP_PASSWORD", None::<&str>),
                ("LERNEJO_SMTP_FROM", None::<&str>),
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
                assert_eq!(options.host, None);
                assert_eq!(options.port, 587);
                Ok(())
            },
        )
    }
}
