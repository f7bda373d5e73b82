//! Scalar field values carried by recipients and their related records.
//!
//! Rule values arrive as raw strings; [`FieldValue::coerce_str`] converts a
//! literal into the kind of the field it is compared against, the way a
//! relational store would cast a bound parameter.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single scalar stored on a recipient or related record.
///
/// Deserialization is untagged: JSON `null`, booleans, integers, floats,
/// RFC 3339 strings and plain strings map to the variants in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    DateTime(DateTime<Utc>),
    Text(String),
}

/// The storage kind of a field, used for coercion and lookup applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "integer")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "text")]
    Text,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "boolean",
            FieldKind::Int => "integer",
            FieldKind::Float => "float",
            FieldKind::DateTime => "datetime",
            FieldKind::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int | FieldKind::Float)
    }

    /// Merge two observed kinds; ints widen to floats, anything else
    /// conflicting degrades to text.
    pub fn merge(self, other: FieldKind) -> FieldKind {
        match (self, other) {
            (a, b) if a == b => a,
            (FieldKind::Int, FieldKind::Float) | (FieldKind::Float, FieldKind::Int) => {
                FieldKind::Float
            }
            _ => FieldKind::Text,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a datetime literal. Naive forms are taken as UTC; a bare date
/// means midnight.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl FieldValue {
    /// Kind of this value, `None` for null.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldKind::Bool),
            FieldValue::Int(_) => Some(FieldKind::Int),
            FieldValue::Float(_) => Some(FieldKind::Float),
            FieldValue::DateTime(_) => Some(FieldKind::DateTime),
            FieldValue::Text(_) => Some(FieldKind::Text),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert a raw literal into a value of `kind`. Returns `None` when the
    /// literal cannot represent that kind (e.g. `"abc"` against an int).
    pub fn coerce_str(kind: FieldKind, raw: &str) -> Option<FieldValue> {
        let trimmed = raw.trim();
        match kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Int => trimmed
                .parse::<i64>()
                .map(FieldValue::Int)
                .or_else(|_| trimmed.parse::<f64>().map(FieldValue::Float))
                .ok(),
            FieldKind::Float => trimmed.parse::<f64>().map(FieldValue::Float).ok(),
            FieldKind::DateTime => parse_datetime(trimmed).map(FieldValue::DateTime),
            FieldKind::Bool => match trimmed {
                "True" | "true" | "1" => Some(FieldValue::Bool(true)),
                "False" | "false" | "0" => Some(FieldValue::Bool(false)),
                _ => None,
            },
        }
    }

    /// Convert this value into `kind` where a lossless reading exists.
    pub fn coerce_to(&self, kind: FieldKind) -> Option<FieldValue> {
        match (self, kind) {
            (FieldValue::Null, _) => None,
            (v, k) if v.kind() == Some(k) => Some(v.clone()),
            (FieldValue::Int(i), FieldKind::Float) => Some(FieldValue::Float(*i as f64)),
            (FieldValue::Float(f), FieldKind::Int) => Some(FieldValue::Float(*f)),
            (FieldValue::Text(s), k) => FieldValue::coerce_str(k, s),
            (v, FieldKind::Text) => Some(FieldValue::Text(v.to_string())),
            (FieldValue::Bool(b), FieldKind::Int) => Some(FieldValue::Int(i64::from(*b))),
            _ => None,
        }
    }

    /// Order two values of compatible kinds. Ints and floats compare
    /// numerically; null or mismatched kinds are unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Float(a), FieldValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::DateTime(a), FieldValue::DateTime(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text rendering used by string lookups (`contains`, `startswith`, ...).
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(true) => f.write_str("True"),
            FieldValue::Bool(false) => f.write_str("False"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn coerce_numeric_literal_to_int() {
        assert_eq!(
            FieldValue::coerce_str(FieldKind::Int, "5"),
            Some(FieldValue::Int(5))
        );
        assert_eq!(FieldValue::coerce_str(FieldKind::Int, "five"), None);
    }

    #[test]
    fn coerce_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        for raw in [
            "2026-03-01 12:30:00",
            "2026-03-01T12:30:00",
            "2026-03-01T12:30:00Z",
            "2026-03-01T14:30:00+02:00",
        ] {
            assert_eq!(
                FieldValue::coerce_str(FieldKind::DateTime, raw),
                Some(FieldValue::DateTime(expected)),
                "format {raw}"
            );
        }
        assert_eq!(
            parse_datetime("2026-03-01"),
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn int_and_float_compare_numerically() {
        assert_eq!(
            FieldValue::Int(3).compare(&FieldValue::Float(2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(FieldValue::Int(3).compare(&FieldValue::Text("3".into())), None);
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
    }

    #[test]
    fn untagged_json_deserialization() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"[null, true, 7, 1.5, "2026-01-02T03:04:05Z", "hello"]"#)
                .unwrap();
        assert_eq!(values[0], FieldValue::Null);
        assert_eq!(values[1], FieldValue::Bool(true));
        assert_eq!(values[2], FieldValue::Int(7));
        assert_eq!(values[3], FieldValue::Float(1.5));
        assert!(matches!(values[4], FieldValue::DateTime(_)));
        assert_eq!(values[5], FieldValue::Text("hello".into()));
    }

    #[test]
    fn kind_merge_widens() {
        assert_eq!(FieldKind::Int.merge(FieldKind::Float), FieldKind::Float);
        assert_eq!(FieldKind::Bool.merge(FieldKind::DateTime), FieldKind::Text);
        assert_eq!(FieldKind::Text.merge(FieldKind::Text), FieldKind::Text);
    }
}
