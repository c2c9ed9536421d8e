//! Mail transport.
//!
//! [`Mailer`] is the seam the dispatcher sends through; [`SmtpMailer`] is the
//! production implementation over an async lettre SMTP transport.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Certificate, Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::EmailConfig;
use crate::core::NotifierError;

/// Sends one rendered message to one recipient.
#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send_email(&self, recipient: &str, subject: &str, body: &[u8]) -> Result<()>;
}

/// SMTP mailer sending HTML messages.
///
/// STARTTLS is used when the server offers it; when a CA certificate is
/// configured it becomes mandatory and the certificate is trusted as a root.
/// Building the mailer does not connect; each send opens its own session.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, NotifierError> {
        let mail_error = |reason: String| NotifierError::Mail {
            reason,
        };

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| mail_error(format!("invalid sender address '{}': {e}", config.from)))?;

        let tls = match &config.cert {
            Some(pem) => {
                let certificate = Certificate::from_pem(pem.as_bytes())
                    .map_err(|e| mail_error(format!("invalid SMTP certificate: {e}")))?;
                let parameters = TlsParameters::builder(config.host.clone())
                    .add_root_certificate(certificate)
                    .build()
                    .map_err(|e| mail_error(format!("unable to configure TLS: {e}")))?;
                Tls::Required(parameters)
            }
            None => Tls::Opportunistic(
                TlsParameters::new(config.host.clone())
                    .map_err(|e| mail_error(format!("unable to configure TLS: {e}")))?,
            ),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .tls(tls)
            .build();

        Ok(Self {
            from,
            transport,
        })
    }

    fn build_message(&self, recipient: &str, subject: &str, body: &[u8]) -> Result<Message> {
        let to: Mailbox =
            recipient.parse().with_context(|| format!("Invalid recipient address '{recipient}'"))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(String::from_utf8_lossy(body).into_owned())
            .context("Unable to build e-mail message")
    }
}

impl Mailer for SmtpMailer {
    async fn send_email(&self, recipient: &str, subject: &str, body: &[u8]) -> Result<()> {
        let message = self.build_message(recipient, subject, body)?;
        let response = self
            .transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery to {recipient} failed"))?;
        debug!(recipient, code = %response.code(), "SMTP server accepted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            from: "Buildpack Notify <no-reply@example.com>".to_string(),
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "mailer".to_string(),
            password: "secret".to_string(),
            cert: None,
        }
    }

    #[test]
    fn test_new_does_not_connect() {
        assert!(SmtpMailer::new(&config()).is_ok());
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut config = config();
        config.from = "nobody".to_string();
        assert!(matches!(SmtpMailer::new(&config), Err(NotifierError::Mail { .. })));
    }

    #[test]
    fn test_invalid_certificate_rejected() {
        let mut config = config();
        config.cert = Some("not a pem".to_string());
        assert!(matches!(SmtpMailer::new(&config), Err(NotifierError::Mail { .. })));
    }

    #[test]
    fn test_build_message_is_html() {
        let mailer = SmtpMailer::new(&config()).unwrap();
        let message = mailer
            .build_message("dev@example.com", "Action required: restage your application", b"<p>hi</p>")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: dev@example.com"));
        assert!(raw.contains("Subject: Action required: restage your application"));
        assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
        assert!(raw.contains("<p>hi</p>"));
    }
}
