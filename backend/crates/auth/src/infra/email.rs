//! Outbound email via SMTP
//!
//! [`SmtpMailer`] wraps the `lettre` async SMTP transport. Delivery is
//! fire-and-forget: `enqueue` hands the message to a background task
//! and returns immediately; the request path never awaits the SMTP
//! round trip. Configuration is loaded from environment variables; if
//! `MAIL_SERVER` is not set the mailer runs disabled and drops
//! messages with a warning.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::domain::repository::{EmailMessage, EmailTemplate, Mailer};

/// Default SMTP port (STARTTLS)
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `MAIL_FROM` is not set
const DEFAULT_FROM_ADDRESS: &str = "noreply@authservice.com";

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP server hostname
    pub server: String,
    /// SMTP server port (defaults to 587)
    pub port: u16,
    /// RFC 5322 "From" address
    pub from_address: String,
    /// Optional SMTP username
    pub username: Option<String>,
    /// Optional SMTP password
    pub password: Option<String>,
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `MAIL_SERVER` is not set, signalling that
    /// email delivery is not configured.
    ///
    /// | Variable        | Required | Default                    |
    /// |-----------------|----------|----------------------------|
    /// | `MAIL_SERVER`   | yes      | -                          |
    /// | `MAIL_PORT`     | no       | `587`                      |
    /// | `MAIL_FROM`     | no       | `noreply@authservice.com`  |
    /// | `MAIL_USERNAME` | no       | -                          |
    /// | `MAIL_PASSWORD` | no       | -                          |
    pub fn from_env() -> Option<Self> {
        let server = std::env::var("MAIL_SERVER").ok()?;
        Some(Self {
            server,
            port: std::env::var("MAIL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            username: std::env::var("MAIL_USERNAME").ok(),
            password: std::env::var("MAIL_PASSWORD").ok(),
        })
    }
}

/// SMTP-backed mailer
#[derive(Clone)]
pub struct SmtpMailer {
    inner: Option<SmtpInner>,
}

#[derive(Clone)]
struct SmtpInner {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from config; `None` config yields a disabled
    /// mailer that logs and drops
    pub fn new(config: Option<MailConfig>) -> Self {
        let inner = config.and_then(|config| {
            let from: Mailbox = match config.from_address.parse() {
                Ok(mailbox) => mailbox,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid MAIL_FROM address, mailer disabled");
                    return None;
                }
            };

            let mut builder =
                match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server) {
                    Ok(builder) => builder.port(config.port),
                    Err(e) => {
                        tracing::error!(error = %e, "Invalid SMTP relay, mailer disabled");
                        return None;
                    }
                };

            if let (Some(user), Some(pass)) = (config.username, config.password) {
                builder = builder.credentials(Credentials::new(user, pass));
            }

            Some(SmtpInner {
                transport: builder.build(),
                from,
            })
        });

        if inner.is_none() {
            tracing::warn!("SMTP not configured, outbound email disabled");
        }

        Self { inner }
    }

    /// Mailer from environment configuration
    pub fn from_env() -> Self {
        Self::new(MailConfig::from_env())
    }
}

impl Mailer for SmtpMailer {
    fn enqueue(&self, message: EmailMessage) {
        let Some(inner) = self.inner.clone() else {
            tracing::warn!(
                subject = %message.subject,
                "Dropping outbound email, SMTP not configured"
            );
            return;
        };

        tokio::spawn(async move {
            for recipient in &message.recipients {
                let to: Mailbox = match recipient.parse() {
                    Ok(mailbox) => mailbox,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unparseable recipient");
                        continue;
                    }
                };

                let email = Message::builder()
                    .from(inner.from.clone())
                    .to(to)
                    .subject(&message.subject)
                    .body(render_body(&message.template));

                match email {
                    Ok(email) => {
                        if let Err(e) = inner.transport.send(email).await {
                            tracing::error!(error = %e, "Failed to send email");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to build email message");
                    }
                }
            }
        });
    }
}

/// Render the plain-text body for a template
fn render_body(template: &EmailTemplate) -> String {
    match template {
        EmailTemplate::RegistrationVerification {
            app_name,
            confirmation_url,
            expires_at,
        } => format!(
            "Welcome to {app_name}!\n\n\
             Please confirm your email address by visiting the link below:\n\n\
             {confirmation_url}\n\n\
             This link expires on {expires_at}.\n\n\
             If you did not request this, you can safely ignore this email.\n"
        ),
    }
}
