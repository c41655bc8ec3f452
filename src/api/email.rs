//! Outbound email delivery abstractions.
//!
//! Verification codes, welcome mail, and password-reset links are delivered
//! through an `EmailSender`. Delivery is fire-and-forget: `dispatch` hands the
//! message to a background task whose failure is logged and never surfaced to
//! the request that triggered it, so a flaky relay cannot fail a registration
//! or verification.
//!
//! The default sender for local dev is `LogEmailSender`, which logs the
//! message and returns `Ok(())`. Production deployments configure
//! `SmtpEmailSender` (STARTTLS relay with credentials).

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    async fn send(&self, message: &EmailMessage) -> Result<()>;

    /// Short transport label reported by `/health`.
    fn kind(&self) -> &'static str;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}

/// SMTP sender using a STARTTLS relay with credentials.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// Build the transport up front so bad configuration fails at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the from address or relay host is invalid.
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &SecretString,
        from: &str,
    ) -> Result<Self> {
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid SMTP from address: {from}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .with_context(|| format!("Failed to build SMTP transport for {host}"))?
            .port(port)
            .credentials(Credentials::new(
                username.to_string(),
                password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message
                .to_email
                .parse()
                .with_context(|| format!("Invalid recipient address: {}", message.to_email))?)
            .subject(message.subject.clone())
            .body(message.body.clone())
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("SMTP send failed")?;

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "smtp"
    }
}

/// Queue a message on a background task.
///
/// Delivery failures are logged, never propagated: the primary state
/// transition already happened by the time the email leaves.
pub fn dispatch(sender: &Arc<dyn EmailSender>, message: EmailMessage) {
    let sender = Arc::clone(sender);
    tokio::spawn(async move {
        if let Err(err) = sender.send(&message).await {
            error!(to_email = %message.to_email, "Failed to send email: {err:#}");
        }
    });
}

pub(crate) fn otp_email(to_email: &str, code: &str, ttl_seconds: i64) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Your Lernejo verification code".to_string(),
        body: format!(
            "Your verification code is {code}. It expires in {} minutes.",
            (ttl_seconds / 60).max(1)
        ),
    }
}

pub(crate) fn welcome_email(to_email: &str, full_name: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Welcome to Lernejo".to_string(),
        body: format!("Hi {full_name}, your email is verified. You can now sign in."),
    }
}

pub(crate) fn reset_email(to_email: &str, reset_url: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Reset your Lernejo password".to_string(),
        body: format!("Use the link below to choose a new password:\n\n{reset_url}"),
    }
}
