//! Mail transport trait and shared error types.

use serde::Serialize;

/// Errors that can occur while building or delivering a message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid message: {0}")]
    Message(String),
}

impl NotifyError {
    /// Configuration errors abort a campaign; everything else is scoped to
    /// one recipient.
    pub fn is_config(&self) -> bool {
        matches!(self, NotifyError::Config(_))
    }
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    /// Resolved from-address, `"Name <addr>"` or a bare address.
    pub from: String,
    pub to: String,
    pub subject: String,
    /// Plain-text body. Always present.
    pub text: String,
    /// HTML alternative, attached only when the body carried markup.
    pub html: Option<String>,
}

impl OutgoingMessage {
    /// The richest body: the HTML alternative if present, otherwise the
    /// plain text.
    pub fn preferred_body(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.text)
    }
}

/// Blocking delivery channel for rendered messages.
pub trait MailTransport: Send + Sync {
    /// Deliver one message. An `Err` means the message was not sent.
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this transport (e.g. `"smtp"`, `"outbox"`).
    fn channel_name(&self) -> &str;
}
