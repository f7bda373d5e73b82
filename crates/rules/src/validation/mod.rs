//! Campaign validation with structured errors and suggestions.
//!
//! Checks a [`Campaign`] before it is saved or activated: document header,
//! sender, message class and every rule's trial application against a
//! sample recipient collection. Returns a [`ValidationResult`] with errors
//! (block activation) and warnings (advisory).

mod campaign_checks;
mod rule_checks;

pub mod fuzzy;

use serde::{Deserialize, Serialize};

use crate::query::RecipientSet;
use crate::schema::Campaign;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location inside the campaign document, e.g. `"spec.rules[1].field"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a parsed [`Campaign`].
///
/// `message_classes` are the aliases the message registry knows; `sample`
/// is the collection each rule is trial-applied to.
pub fn validate_campaign(
    campaign: &Campaign,
    sample: &RecipientSet,
    message_classes: &[&str],
) -> ValidationResult {
    let mut result = ValidationResult::new();
    campaign_checks::validate_header(campaign, &mut result);
    campaign_checks::validate_sender(campaign, &mut result);
    campaign_checks::validate_message(campaign, message_classes, &mut result);
    rule_checks::validate_rules(campaign, sample, &mut result);
    result
}

/// Parse raw YAML and validate. Returns parse errors merged with validation errors.
pub fn validate_yaml(
    yaml: &str,
    sample: &RecipientSet,
    message_classes: &[&str],
) -> ValidationResult {
    match Campaign::from_yaml(yaml) {
        Ok(campaign) => validate_campaign(&campaign, sample, message_classes),
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            result
        }
    }
}

#[cfg(test)]
mod tests;
