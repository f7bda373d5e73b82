//! Identity metadata shared by campaign documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Campaign identity. `name` is unique across the loaded set and doubles as
/// the key delivery records are filed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CampaignMetadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Campaigns are opt-in: a freshly written document does not send.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CampaignMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: None,
            enabled: false,
            created_at: None,
            updated_at: None,
        }
    }
}
