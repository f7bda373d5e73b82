//! Single declarative rule: field path, lookup, raw value, mode.

use drip_core::FieldPath;
use serde::{Deserialize, Deserializer, Serialize};

use super::{LookupType, RuleMode};

/// One condition of a campaign's audience definition.
///
/// `value` is kept exactly as written. Relative-time expressions
/// (`now-7 days`, `today+1 day`), field references (`F_profile.credits`) and
/// boolean literals are resolved each time the rule is applied, so a
/// campaign stays valid as time passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QueryRule {
    pub field: FieldPath,
    #[serde(default)]
    pub lookup: LookupType,
    #[serde(default)]
    pub mode: RuleMode,
    #[serde(deserialize_with = "scalar_string")]
    pub value: String,
}

impl QueryRule {
    pub fn new(field: FieldPath, lookup: LookupType, value: impl Into<String>) -> Self {
        Self {
            field,
            lookup,
            mode: RuleMode::Filter,
            value: value.into(),
        }
    }

    pub fn exclude(mut self) -> Self {
        self.mode = RuleMode::Exclude;
        self
    }
}

/// Accept any YAML scalar for `value`; booleans are written the way the
/// rule-value grammar spells them (`True`/`False`).
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(true) => Ok("True".to_string()),
        serde_yaml::Value::Bool(false) => Ok("False".to_string()),
        other => Err(serde::de::Error::custom(format!(
            "rule value must be a scalar, got {other:?}"
        ))),
    }
}
