//! Lookup operators and rule modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator applied between a field and a rule value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupType {
    #[default]
    Exact,
    IExact,
    Contains,
    IContains,
    Regex,
    IRegex,
    Gt,
    Gte,
    Lt,
    Lte,
    StartsWith,
    EndsWith,
    IStartsWith,
    IEndsWith,
}

impl LookupType {
    pub const ALL: [LookupType; 14] = [
        LookupType::Exact,
        LookupType::IExact,
        LookupType::Contains,
        LookupType::IContains,
        LookupType::Regex,
        LookupType::IRegex,
        LookupType::Gt,
        LookupType::Gte,
        LookupType::Lt,
        LookupType::Lte,
        LookupType::StartsWith,
        LookupType::EndsWith,
        LookupType::IStartsWith,
        LookupType::IEndsWith,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupType::Exact => "exact",
            LookupType::IExact => "iexact",
            LookupType::Contains => "contains",
            LookupType::IContains => "icontains",
            LookupType::Regex => "regex",
            LookupType::IRegex => "iregex",
            LookupType::Gt => "gt",
            LookupType::Gte => "gte",
            LookupType::Lt => "lt",
            LookupType::Lte => "lte",
            LookupType::StartsWith => "startswith",
            LookupType::EndsWith => "endswith",
            LookupType::IStartsWith => "istartswith",
            LookupType::IEndsWith => "iendswith",
        }
    }

    /// Lookups that operate on the text rendering of a value.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            LookupType::IExact
                | LookupType::Contains
                | LookupType::IContains
                | LookupType::Regex
                | LookupType::IRegex
                | LookupType::StartsWith
                | LookupType::EndsWith
                | LookupType::IStartsWith
                | LookupType::IEndsWith
        )
    }

    /// Lookups that need an ordering between field and value.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            LookupType::Gt | LookupType::Gte | LookupType::Lt | LookupType::Lte
        )
    }

    pub fn is_case_insensitive(&self) -> bool {
        matches!(
            self,
            LookupType::IExact
                | LookupType::IContains
                | LookupType::IRegex
                | LookupType::IStartsWith
                | LookupType::IEndsWith
        )
    }
}

impl fmt::Display for LookupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupType::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown lookup type: {s:?}"))
    }
}

/// Whether a rule narrows the audience to matches or removes matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    #[default]
    Filter,
    Exclude,
}

impl fmt::Display for RuleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleMode::Filter => f.write_str("filter"),
            RuleMode::Exclude => f.write_str("exclude"),
        }
    }
}
