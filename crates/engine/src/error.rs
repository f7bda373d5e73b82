use drip_core::{CoreError, RecipientId};
use drip_notify::NotifyError;
use drip_rules::RuleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Delivery store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("campaign '{0}' is a read-only preview and cannot send")]
    ReadOnlyPreview(String),

    #[error("no recipient with id {0}")]
    UnknownRecipient(RecipientId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Errors scoped to one campaign's definition or message class. The
    /// batch skips the campaign and moves on.
    pub fn is_config(&self) -> bool {
        match self {
            EngineError::Rule(e) => !matches!(e, RuleError::Io(_)),
            EngineError::Notify(e) => e.is_config(),
            EngineError::Config(_) => true,
            _ => false,
        }
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => EngineError::Io(e),
            CoreError::Serialize(e) => EngineError::Json(e),
            other => EngineError::Config(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
