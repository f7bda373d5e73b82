//! Top-level drip campaign document.

use serde::{Deserialize, Serialize};

use super::{CampaignMetadata, QueryRule};

/// Expected `kind` of a campaign document.
pub const CAMPAIGN_KIND: &str = "Drip";

/// A drip campaign: who receives it (rules) and what they receive
/// (templates, sender, message class).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Campaign {
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: CampaignMetadata,
    pub spec: CampaignSpec,
}

/// Sender, templates and audience rules of a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CampaignSpec {
    /// Custom sender address; the configured default is used when absent.
    #[serde(default)]
    pub from_email: Option<String>,
    /// Display name for `from_email`.
    #[serde(default)]
    pub from_email_name: Option<String>,
    #[serde(default)]
    pub subject_template: String,
    #[serde(default)]
    pub body_template: String,
    /// Message-builder alias, resolved through the message registry.
    #[serde(default = "default_message_class")]
    pub message_class: String,
    /// Ordered audience rules. An empty list matches every recipient.
    #[serde(default)]
    pub rules: Vec<QueryRule>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    CAMPAIGN_KIND.to_string()
}

fn default_message_class() -> String {
    "default".to_string()
}

impl Campaign {
    /// Build an in-memory campaign with the default message class.
    pub fn new(
        name: impl Into<String>,
        subject_template: impl Into<String>,
        body_template: impl Into<String>,
    ) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: CampaignMetadata::named(name),
            spec: CampaignSpec {
                from_email: None,
                from_email_name: None,
                subject_template: subject_template.into(),
                body_template: body_template.into(),
                message_class: default_message_class(),
                rules: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn enabled(&self) -> bool {
        self.metadata.enabled
    }

    pub fn rules(&self) -> &[QueryRule] {
        &self.spec.rules
    }

    pub fn with_rule(mut self, rule: QueryRule) -> Self {
        self.spec.rules.push(rule);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.metadata.enabled = enabled;
        self
    }

    pub fn with_sender(mut self, email: impl Into<String>, name: Option<String>) -> Self {
        self.spec.from_email = Some(email.into());
        self.spec.from_email_name = name;
        self
    }

    /// Parse a campaign from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}
