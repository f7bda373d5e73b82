//! Relation-aware field paths such as `joined_at`, `profile.credits` or
//! `sent_drips__count`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Trailing segment that requests a distinct-count aggregation.
pub const COUNT_SEGMENT: &str = "count";

/// A parsed field path. `.` and `__` are interchangeable separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidPath(raw.to_string()));
        }
        let segments: Vec<String> = trimmed
            .split("__")
            .flat_map(|part| part.split('.'))
            .map(str::to_string)
            .collect();
        let well_formed = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !well_formed {
            return Err(CoreError::InvalidPath(raw.to_string()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `true` when the last segment is `count` on a multi-segment path.
    pub fn is_count(&self) -> bool {
        self.segments.len() > 1
            && self.segments.last().map(String::as_str) == Some(COUNT_SEGMENT)
    }

    /// The relation path a count aggregation runs over (`sent_drips` for
    /// `sent_drips__count`).
    pub fn count_target(&self) -> Option<FieldPath> {
        if !self.is_count() {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(Self {
            raw: segments.join("__"),
            segments,
        })
    }

    /// Segments joined with `_`, used to synthesize annotation names.
    pub fn underscored(&self) -> String {
        self.segments.join("_")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.raw
    }
}

impl std::str::FromStr for FieldPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        FieldPath::parse(s)
    }
}
