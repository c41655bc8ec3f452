use crate::{
    api,
    api::email::{EmailSender, LogEmailSender, SmtpEmailSender},
    api::handlers::auth::AuthConfig,
    cli::commands::smtp,
};
use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub frontend_base_url: String,
    pub smtp: smtp::Options,
}

/// Execute the server action.
///
/// # Errors
///
/// Returns an error if the SMTP transport cannot be built or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.jwt_secret, args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_otp_ttl_seconds(args.otp_ttl_seconds);

    let sender: Arc<dyn EmailSender> = match args.smtp.host {
        Some(ref host) => {
            let username = args
                .smtp
                .username
                .as_deref()
                .ok_or_else(|| anyhow!("SMTP username is required"))?;
            let password = args
                .smtp
                .password
                .as_ref()
                .ok_or_else(|| anyhow!("SMTP password is required"))?;
            let from = args
                .smtp
                .from
                .as_deref()
                .ok_or_else(|| anyhow!("SMTP from address is required"))?;
            Arc::new(SmtpEmailSender::new(
                host,
                args.smtp.port,
                username,
                password,
                from,
            )?)
        }
        None => {
            warn!("SMTP host not configured, outbound email is logged only");
            Arc::new(LogEmailSender)
        }
    };

    api::new(args.port, args.dsn, auth_config, sender).await
}
