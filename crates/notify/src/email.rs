//! SMTP mail transport via `lettre` with TLS support.
//!
//! Delivers rendered messages through an SMTP server. Supports STARTTLS,
//! implicit TLS (port 465) and unencrypted connections.

use drip_core::config::SmtpConfig;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use crate::traits::{MailTransport, NotifyError, OutgoingMessage};

/// Sends messages via SMTP.
#[derive(Debug)]
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Build an `SmtpMailer` from SMTP configuration.
    ///
    /// Port 465 uses implicit TLS; other ports use STARTTLS when `tls` is
    /// set and a plain connection otherwise. Credentials are attached when
    /// both username and password are configured.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST is not set".to_string()))?;
        let port = config.port;

        let mut builder = if port == 465 {
            SmtpTransport::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            SmtpTransport::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            SmtpTransport::builder_dangerous(host).port(port)
        };

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Message(format!("{addr:?}: {e}")))
}

/// Build the wire message: a single plain-text part, or a
/// `multipart/alternative` with plain text and HTML.
pub fn build_email(message: &OutgoingMessage) -> Result<Message, NotifyError> {
    let builder = Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .subject(message.subject.as_str());

    let email = match &message.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            html.clone(),
        )),
        None => builder.singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_PLAIN)
                .body(message.text.clone()),
        ),
    };
    email.map_err(|e| NotifyError::Message(e.to_string()))
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        let email = build_email(message)?;
        self.transport
            .send(&email)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::debug!(
            channel = "smtp",
            to = %message.to,
            subject = %message.subject,
            "message delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp(host: Option<&str>, port: u16, tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: host.map(str::to_string),
            port,
            tls,
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
        }
    }

    fn message(html: Option<&str>) -> OutgoingMessage {
        OutgoingMessage {
            from: "Drips <drips@example.com>".to_string(),
            to: "kitty@example.com".to_string(),
            subject: "HELLO kitty".to_string(),
            text: "KETTEHS ROCK!".to_string(),
            html: html.map(str::to_string),
        }
    }

    #[test]
    fn from_config_variants() {
        assert!(SmtpMailer::from_config(&smtp(Some("smtp.example.com"), 587, true)).is_ok());
        assert!(SmtpMailer::from_config(&smtp(Some("smtp.example.com"), 465, true)).is_ok());
        assert!(SmtpMailer::from_config(&smtp(Some("localhost"), 25, false)).is_ok());
    }

    #[test]
    fn from_config_requires_host() {
        let err = SmtpMailer::from_config(&smtp(None, 587, true)).unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"), "got: {err}");
    }

    #[test]
    fn channel_name_is_smtp() {
        let mailer = SmtpMailer::from_config(&smtp(Some("smtp.example.com"), 587, true)).unwrap();
        assert_eq!(mailer.channel_name(), "smtp");
    }

    #[test]
    fn build_plain_email() {
        let email = build_email(&message(None)).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Subject: HELLO kitty"));
        assert!(raw.contains("To: kitty@example.com"));
        assert!(raw.contains("text/plain"));
        assert!(!raw.contains("text/html"));
    }

    #[test]
    fn build_alternative_email() {
        let email = build_email(&message(Some("<h1>KETTEHS ROCK!</h1>"))).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn bad_address_is_a_message_error() {
        let mut bad = message(None);
        bad.to = "not-an-email".to_string();
        assert!(matches!(build_email(&bad), Err(NotifyError::Message(_))));
    }
}
