//! Message-class registry: campaign alias → builder kind.
//!
//! Populated from [`Config::message_classes`] at startup. Resolution
//! failures are configuration errors raised when a campaign sends.

use std::collections::BTreeMap;

use drip_core::config::DEFAULT_MESSAGE_CLASS;
use drip_core::Config;

use crate::message::{MessageBuilder, MessageTemplate, MultipartMessage, PlainTextMessage};
use crate::traits::NotifyError;

/// Builder implementations the registry can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Multipart,
    PlainText,
}

impl MessageKind {
    pub const ALL: [MessageKind; 2] = [MessageKind::Multipart, MessageKind::PlainText];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Multipart => MultipartMessage::KIND,
            MessageKind::PlainText => PlainTextMessage::KIND,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }

    pub fn build(self, template: MessageTemplate) -> Box<dyn MessageBuilder> {
        match self {
            MessageKind::Multipart => Box::new(MultipartMessage::new(template)),
            MessageKind::PlainText => Box::new(PlainTextMessage::new(template)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageRegistry {
    classes: BTreeMap<String, String>,
}

impl MessageRegistry {
    pub fn new(classes: BTreeMap<String, String>) -> Self {
        Self { classes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.message_classes.clone())
    }

    /// Resolve a campaign's message-class alias.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Config`] when the alias is not registered or maps to
    /// an unknown builder kind.
    pub fn resolve(&self, alias: &str) -> Result<MessageKind, NotifyError> {
        let kind = self.classes.get(alias).ok_or_else(|| {
            NotifyError::Config(format!("message class '{alias}' is not registered"))
        })?;
        MessageKind::parse(kind).ok_or_else(|| {
            NotifyError::Config(format!(
                "message class '{alias}' maps to unknown builder '{kind}'"
            ))
        })
    }

    /// Construct the builder registered under `alias`.
    pub fn builder(
        &self,
        alias: &str,
        template: MessageTemplate,
    ) -> Result<Box<dyn MessageBuilder>, NotifyError> {
        Ok(self.resolve(alias)?.build(template))
    }

    /// Aliases that resolve to a known builder.
    pub fn aliases(&self) -> Vec<&str> {
        self.classes
            .iter()
            .filter(|(_, kind)| MessageKind::parse(kind).is_some())
            .map(|(alias, _)| alias.as_str())
            .collect()
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new(BTreeMap::from([(
            DEFAULT_MESSAGE_CLASS.to_string(),
            MultipartMessage::KIND.to_string(),
        )]))
    }
}
