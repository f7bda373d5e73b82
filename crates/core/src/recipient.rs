//! Recipient entities and their related records.
//!
//! A recipient is an opaque user-directory entry: an id, an email address,
//! scalar fields and named to-many relations. Field paths walk relations
//! segment by segment; a path through a multi-valued relation reaches every
//! related record, so one recipient may yield several values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::value::FieldValue;

pub type RecipientId = i64;

/// A related entity reachable from a recipient (profile, purchases, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Vec<Record>>,
}

/// A message recipient as exposed by the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub email: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Vec<Record>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_relation(mut self, name: &str, records: Vec<Record>) -> Self {
        self.relations.insert(name.to_string(), records);
        self
    }
}

impl Recipient {
    pub fn new(id: RecipientId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            fields: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_relation(mut self, name: &str, records: Vec<Record>) -> Self {
        self.relations.insert(name.to_string(), records);
        self
    }

    /// Scalar lookup on the root entity, including the built-in `id` and
    /// `email` columns.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match self.fields.get(name) {
            Some(v) => Some(v.clone()),
            None => match name {
                "id" => Some(FieldValue::Int(self.id)),
                "email" => Some(FieldValue::Text(self.email.clone())),
                _ => None,
            },
        }
    }

    /// Every scalar value reachable through `path`. Empty when the path
    /// leads nowhere on this recipient.
    pub fn values_at(&self, path: &FieldPath) -> Vec<FieldValue> {
        let segments = path.segments();
        let Some((last, relations)) = segments.split_last() else {
            return Vec::new();
        };
        if relations.is_empty() {
            return self.field(last).into_iter().collect();
        }
        let mut out = Vec::new();
        if let Some(records) = self.relations.get(&relations[0]) {
            for record in records {
                collect_values(record, &relations[1..], last, &mut out);
            }
        }
        out
    }

    /// Every related record reachable through the relation `path`.
    pub fn related_at(&self, path: &FieldPath) -> Vec<&Record> {
        let segments = path.segments();
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(records) = self.relations.get(first) {
            for record in records {
                collect_records(record, rest, &mut out);
            }
        }
        out
    }

    /// Store a computed value (e.g. an aggregation) on the root entity.
    pub fn annotate(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }
}

fn collect_values(record: &Record, relations: &[String], field: &str, out: &mut Vec<FieldValue>) {
    match relations.split_first() {
        None => {
            if let Some(v) = record.fields.get(field) {
                out.push(v.clone());
            } else if field == "id" {
                if let Some(id) = record.id {
                    out.push(FieldValue::Int(id));
                }
            }
        }
        Some((next, rest)) => {
            if let Some(children) = record.relations.get(next) {
                for child in children {
                    collect_values(child, rest, field, out);
                }
            }
        }
    }
}

fn collect_records<'a>(record: &'a Record, rest: &[String], out: &mut Vec<&'a Record>) {
    match rest.split_first() {
        None => out.push(record),
        Some((next, tail)) => {
            if let Some(children) = record.relations.get(next) {
                for child in children {
                    collect_records(child, tail, out);
                }
            }
        }
    }
}
