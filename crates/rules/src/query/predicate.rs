//! Field predicates: `{field_path, lookup, value}` triples and their
//! compiled, schema-checked form.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use drip_core::{FieldKind, FieldPath, FieldSchema, FieldValue, Recipient, SchemaEntry};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::schema::LookupType;

/// A rule value after apply-time resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RuleValue {
    /// Raw literal; coerced to the compared field's kind by the collection.
    Literal(String),
    /// Result of a `now±` / `today±` expression.
    DateTime(DateTime<Utc>),
    /// `True` / `False`.
    Bool(bool),
    /// `F_<path>`: compare against another field of the same recipient.
    FieldRef(FieldPath),
}

impl std::fmt::Display for RuleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleValue::Literal(s) => write!(f, "{s:?}"),
            RuleValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            RuleValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            RuleValue::FieldRef(path) => write!(f, "F({path})"),
        }
    }
}

/// `field__lookup = value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: FieldPath,
    pub lookup: LookupType,
    pub value: RuleValue,
}

impl Predicate {
    pub fn new(field: FieldPath, lookup: LookupType, value: RuleValue) -> Self {
        Self {
            field,
            lookup,
            value,
        }
    }

    /// Check the predicate against `schema` and prepare it for evaluation.
    ///
    /// # Errors
    ///
    /// [`RuleError::Field`] when the path is unknown or names a relation,
    /// [`RuleError::Lookup`] when the lookup cannot apply to the value.
    ///
    /// A field with no typed value anywhere compiles to a predicate that
    /// matches nobody, as null never satisfies a lookup.
    pub fn compile(&self, schema: &FieldSchema) -> Result<CompiledPredicate> {
        let untyped = || CompiledPredicate {
            field: self.field.clone(),
            lookup: self.lookup,
            operand: Operand::Nothing,
        };
        let Some(kind) = field_kind(schema, &self.field)? else {
            if let RuleValue::FieldRef(path) = &self.value {
                field_kind(schema, path)?;
            }
            return Ok(untyped());
        };
        let lookup_err = |reason: String| RuleError::Lookup {
            lookup: self.lookup.as_str().to_string(),
            reason,
        };

        let operand = match (&self.value, self.lookup) {
            (RuleValue::FieldRef(path), _) => {
                let Some(ref_kind) = field_kind(schema, path)? else {
                    return Ok(untyped());
                };
                let comparable = self.lookup.is_text()
                    || ref_kind == kind
                    || (ref_kind.is_numeric() && kind.is_numeric());
                if !comparable {
                    return Err(lookup_err(format!(
                        "cannot compare {kind} `{}` with {ref_kind} `{path}`",
                        self.field
                    )));
                }
                Operand::FieldRef(path.clone())
            }
            (value, LookupType::Regex | LookupType::IRegex) => {
                let pattern = operand_text(value);
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(self.lookup == LookupType::IRegex)
                    .build()
                    .map_err(|e| lookup_err(format!("invalid pattern {pattern:?}: {e}")))?;
                Operand::Pattern(regex)
            }
            (RuleValue::DateTime(dt), lookup) => {
                if kind != FieldKind::DateTime || lookup.is_text() {
                    return Err(lookup_err(format!(
                        "a datetime value cannot be applied to {kind} `{}`",
                        self.field
                    )));
                }
                Operand::Value(FieldValue::DateTime(*dt))
            }
            (RuleValue::Bool(b), lookup) => {
                if kind != FieldKind::Bool || lookup.is_text() || lookup.is_ordering() {
                    return Err(lookup_err(format!(
                        "a boolean value cannot be applied to {kind} `{}`",
                        self.field
                    )));
                }
                Operand::Value(FieldValue::Bool(*b))
            }
            (RuleValue::Literal(raw), lookup) if lookup.is_text() => {
                Operand::Text(fold(raw, lookup.is_case_insensitive()))
            }
            (RuleValue::Literal(raw), _) => {
                let value = FieldValue::coerce_str(kind, raw).ok_or_else(|| {
                    lookup_err(format!("{raw:?} is not a valid {kind} for `{}`", self.field))
                })?;
                Operand::Value(value)
            }
        };

        Ok(CompiledPredicate {
            field: self.field.clone(),
            lookup: self.lookup,
            operand,
        })
    }
}

/// Kind of the field at `path`; `None` when it resolves but is untyped.
fn field_kind(schema: &FieldSchema, path: &FieldPath) -> Result<Option<FieldKind>> {
    match schema.entry(path) {
        Some(SchemaEntry::Field(kind)) => Ok(Some(kind)),
        Some(SchemaEntry::Untyped) => Ok(None),
        Some(SchemaEntry::Relation) => Err(RuleError::Field(format!(
            "`{path}` is a relation; compare one of its fields or use `{path}__count`"
        ))),
        None => Err(RuleError::Field(format!("cannot resolve `{path}` on recipient"))),
    }
}

fn operand_text(value: &RuleValue) -> String {
    match value {
        RuleValue::Literal(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fold(s: &str, insensitive: bool) -> String {
    if insensitive {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}

/// Prepared right-hand side of a predicate.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(FieldValue),
    /// Already case-folded for insensitive lookups.
    Text(String),
    Pattern(Regex),
    FieldRef(FieldPath),
    /// The compared field has no kind; nothing matches.
    Nothing,
}

/// A predicate validated against a schema, ready for per-recipient checks.
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    pub field: FieldPath,
    pub lookup: LookupType,
    pub operand: Operand,
}

impl CompiledPredicate {
    /// `true` when any value reachable through the field path satisfies the
    /// lookup. Recipients without a value never match.
    pub fn matches(&self, recipient: &Recipient) -> bool {
        if matches!(self.operand, Operand::Nothing) {
            return false;
        }
        let values = recipient.values_at(&self.field);
        if values.is_empty() {
            return false;
        }
        match &self.operand {
            Operand::FieldRef(path) => {
                let Some(other) = recipient
                    .values_at(path)
                    .into_iter()
                    .find(|v| !v.is_null())
                else {
                    return false;
                };
                values.iter().any(|v| self.matches_dynamic(v, &other))
            }
            operand => values.iter().any(|v| self.matches_static(v, operand)),
        }
    }

    fn matches_static(&self, value: &FieldValue, operand: &Operand) -> bool {
        if value.is_null() {
            return false;
        }
        match operand {
            Operand::Pattern(re) => value.as_text().is_some_and(|t| re.is_match(&t)),
            Operand::Text(needle) => value
                .as_text()
                .is_some_and(|t| text_match(self.lookup, &t, needle)),
            Operand::Value(target) => compare_match(self.lookup, value, target),
            Operand::FieldRef(_) | Operand::Nothing => false,
        }
    }

    fn matches_dynamic(&self, value: &FieldValue, other: &FieldValue) -> bool {
        if value.is_null() {
            return false;
        }
        if self.lookup.is_text() {
            let (Some(text), Some(needle)) = (value.as_text(), other.as_text()) else {
                return false;
            };
            if matches!(self.lookup, LookupType::Regex | LookupType::IRegex) {
                return RegexBuilder::new(&needle)
                    .case_insensitive(self.lookup == LookupType::IRegex)
                    .build()
                    .map(|re| re.is_match(&text))
                    .unwrap_or(false);
            }
            let needle = fold(&needle, self.lookup.is_case_insensitive());
            return text_match(self.lookup, &text, &needle);
        }
        let Some(kind) = value.kind() else {
            return false;
        };
        match other.coerce_to(kind) {
            Some(target) => compare_match(self.lookup, value, &target),
            None => false,
        }
    }
}

fn text_match(lookup: LookupType, text: &str, needle: &str) -> bool {
    let text = fold(text, lookup.is_case_insensitive());
    match lookup {
        LookupType::IExact => text == needle,
        LookupType::Contains | LookupType::IContains => text.contains(needle),
        LookupType::StartsWith | LookupType::IStartsWith => text.starts_with(needle),
        LookupType::EndsWith | LookupType::IEndsWith => text.ends_with(needle),
        _ => false,
    }
}

fn compare_match(lookup: LookupType, value: &FieldValue, target: &FieldValue) -> bool {
    let Some(ordering) = value.compare(target) else {
        return false;
    };
    match lookup {
        LookupType::Exact | LookupType::IExact => ordering == Ordering::Equal,
        LookupType::Gt => ordering == Ordering::Greater,
        LookupType::Gte => ordering != Ordering::Less,
        LookupType::Lt => ordering == Ordering::Less,
        LookupType::Lte => ordering != Ordering::Greater,
        _ => false,
    }
}
