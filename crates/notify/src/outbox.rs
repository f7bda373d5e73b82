//! Non-SMTP transports: an in-memory outbox and a logging transport for
//! dry runs.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::traits::{MailTransport, NotifyError, OutgoingMessage};

/// Keeps every delivered message in memory. Addresses registered with
/// [`Outbox::reject`] fail delivery.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: RwLock<Vec<OutgoingMessage>>,
    rejected: RwLock<HashSet<String>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make delivery to `address` fail.
    pub fn reject(&self, address: impl Into<String>) {
        self.rejected
            .write()
            .expect("outbox lock poisoned")
            .insert(address.into());
    }

    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.read().expect("outbox lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.sent.read().expect("outbox lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MailTransport for Outbox {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        if self
            .rejected
            .read()
            .expect("outbox lock poisoned")
            .contains(&message.to)
        {
            return Err(NotifyError::Smtp(format!("mailbox unavailable: {}", message.to)));
        }
        self.sent
            .write()
            .expect("outbox lock poisoned")
            .push(message.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "outbox"
    }
}

/// Logs each message at info level and reports success without delivering.
#[derive(Debug, Default)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        tracing::info!(
            channel = "log",
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            html = message.html.is_some(),
            "dry-run message"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
