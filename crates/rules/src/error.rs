//! Error types shared across rule compilation, loading and validation.

use drip_core::CoreError;

/// Errors that can occur while resolving, applying or loading rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// Interval string matched neither duration grammar.
    #[error("'{0}' is not a valid time interval")]
    Duration(String),

    /// Field path is malformed or unknown to the recipient schema.
    #[error("Field error: {0}")]
    Field(String),

    /// Lookup cannot be applied to the field/value combination.
    #[error("Lookup error: `{lookup}` {reason}")]
    Lookup { lookup: String, reason: String },

    /// A rule failed its trial application. Carries the underlying cause's
    /// type name and message.
    #[error("{kind} raised trying to apply rule: {message}")]
    Validation { kind: String, message: String },

    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two campaign documents share a name.
    #[error("Duplicate campaign name: {0}")]
    Duplicate(String),
}

impl RuleError {
    /// Short type name used when wrapping this error in a validation error.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuleError::Duration(_) => "DurationError",
            RuleError::Field(_) => "FieldError",
            RuleError::Lookup { .. } => "LookupError",
            RuleError::Validation { .. } => "ValidationError",
            RuleError::Io(_) => "IoError",
            RuleError::Parse(_) => "ParseError",
            RuleError::Duplicate(_) => "DuplicateError",
        }
    }

    /// Wrap this error as a [`RuleError::Validation`].
    pub fn into_validation(self) -> RuleError {
        match self {
            already @ RuleError::Validation { .. } => already,
            other => RuleError::Validation {
                kind: other.kind_name().to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for RuleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPath(path) => RuleError::Field(format!("malformed path {path:?}")),
            CoreError::Io(e) => RuleError::Io(e),
            other => RuleError::Field(other.to_string()),
        }
    }
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
