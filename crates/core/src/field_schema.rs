//! Queryable shape of the recipient entity: which field paths exist and
//! what kind each one holds.
//!
//! The schema is what lets a rule be rejected at configuration time for a
//! typo such as `date__joined` instead of silently matching nobody at run
//! time.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::recipient::{Recipient, Record};
use crate::value::FieldKind;

/// Path fragments hidden from field discovery by default.
pub const DEFAULT_EXCLUDES: &[&str] = &["password", "permissions"];

/// Default relation depth for [`FieldSchema::simple_fields`].
pub const DEFAULT_STACK_LIMIT: usize = 2;

/// What a field path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEntry {
    Field(FieldKind),
    /// A known field with no typed value observed yet.
    Untyped,
    Relation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldKind>,
    #[serde(default)]
    pub relations: BTreeMap<String, FieldSchema>,
    /// Fields seen only as null. They resolve but carry no kind.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub untyped: BTreeSet<String>,
}

/// A recipient directory as stored on disk: either a bare array of
/// recipients, or an object carrying a declared schema next to them.
///
/// ```json
/// {"schema": {"fields": {"joined_at": "datetime"}}, "recipients": []}
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DirectoryDocument {
    Rows(Vec<Recipient>),
    Declared {
        #[serde(default)]
        schema: FieldSchema,
        #[serde(default)]
        recipients: Vec<Recipient>,
    },
}

impl DirectoryDocument {
    /// Split into the declared schema, if any, and the recipient rows.
    pub fn into_parts(self) -> (Option<FieldSchema>, Vec<Recipient>) {
        match self {
            DirectoryDocument::Declared { schema, recipients } => (Some(schema), recipients),
            DirectoryDocument::Rows(recipients) => (None, recipients),
        }
    }
}

impl FieldSchema {
    /// Schema with only the built-in `id` and `email` columns.
    pub fn recipient_base() -> Self {
        let mut schema = Self::default();
        schema.fields.insert("id".to_string(), FieldKind::Int);
        schema.fields.insert("email".to_string(), FieldKind::Text);
        schema
    }

    /// Infer the schema from observed recipients. Null values contribute
    /// the field name but no kind; a field that is null everywhere stays
    /// untyped.
    pub fn infer<'a>(recipients: impl IntoIterator<Item = &'a Recipient>) -> Self {
        let mut schema = Self::recipient_base();
        for recipient in recipients {
            for (name, value) in &recipient.fields {
                schema.observe_value(name, value.kind());
            }
            for (name, records) in &recipient.relations {
                let child = schema.relations.entry(name.clone()).or_default();
                for record in records {
                    child.observe_record(record);
                }
            }
        }
        schema.settle();
        schema
    }

    fn observe_value(&mut self, name: &str, kind: Option<FieldKind>) {
        match kind {
            Some(kind) => {
                self.fields
                    .entry(name.to_string())
                    .and_modify(|existing| *existing = existing.merge(kind))
                    .or_insert(kind);
            }
            None => {
                self.untyped.insert(name.to_string());
            }
        }
    }

    fn observe_record(&mut self, record: &Record) {
        if record.id.is_some() {
            self.observe_value("id", Some(FieldKind::Int));
        }
        for (name, value) in &record.fields {
            self.observe_value(name, value.kind());
        }
        for (name, records) in &record.relations {
            let child = self.relations.entry(name.clone()).or_default();
            for r in records {
                child.observe_record(r);
            }
        }
    }

    /// Drop untyped names that gained a kind, recursively.
    fn settle(&mut self) {
        let fields = &self.fields;
        self.untyped.retain(|name| !fields.contains_key(name));
        for child in self.relations.values_mut() {
            child.settle();
        }
    }

    /// Overlay `declared` on this schema. Declared kinds win over observed
    /// ones; declared relations are merged recursively.
    pub fn merged_with(mut self, declared: &FieldSchema) -> Self {
        for (name, kind) in &declared.fields {
            self.fields.insert(name.clone(), *kind);
        }
        self.untyped.extend(declared.untyped.iter().cloned());
        for (name, child) in &declared.relations {
            let merged = self
                .relations
                .remove(name)
                .unwrap_or_default()
                .merged_with(child);
            self.relations.insert(name.clone(), merged);
        }
        self.settle();
        self
    }

    /// Register a computed root-level field such as a count annotation.
    pub fn annotate(&mut self, name: &str, kind: FieldKind) {
        self.fields.insert(name.to_string(), kind);
    }

    pub fn with_field(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.insert(name.to_string(), kind);
        self
    }

    pub fn with_relation(mut self, name: &str, schema: FieldSchema) -> Self {
        self.relations.insert(name.to_string(), schema);
        self
    }

    /// Resolve a path against the schema.
    pub fn entry(&self, path: &FieldPath) -> Option<SchemaEntry> {
        let (last, relations) = path.segments().split_last()?;
        let mut node = self;
        for segment in relations {
            node = node.relations.get(segment)?;
        }
        if let Some(kind) = node.fields.get(last) {
            return Some(SchemaEntry::Field(*kind));
        }
        if node.untyped.contains(last) {
            return Some(SchemaEntry::Untyped);
        }
        node.relations.get(last).map(|_| SchemaEntry::Relation)
    }

    /// Every field path with its kind name, recursing through relations.
    ///
    /// Recursion stops at `stack_limit` relation hops and whenever a
    /// relation name repeats on the current stack. Paths containing any
    /// `excludes` fragment are skipped.
    pub fn simple_fields(&self, stack_limit: usize, excludes: &[&str]) -> Vec<(String, String)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        self.walk_fields("", &mut stack, stack_limit, excludes, &mut out);
        out
    }

    fn walk_fields(
        &self,
        parent: &str,
        stack: &mut Vec<String>,
        stack_limit: usize,
        excludes: &[&str],
        out: &mut Vec<(String, String)>,
    ) {
        let join = |name: &str| {
            if parent.is_empty() {
                name.to_string()
            } else {
                format!("{parent}__{name}")
            }
        };

        for (name, kind) in &self.fields {
            let full = join(name);
            if excludes.iter().any(|ex| full.contains(ex)) {
                continue;
            }
            out.push((full, kind.name().to_string()));
        }

        for name in &self.untyped {
            let full = join(name);
            if excludes.iter().any(|ex| full.contains(ex)) {
                continue;
            }
            out.push((full, "unknown".to_string()));
        }

        for (name, child) in &self.relations {
            let full = join(name);
            if excludes.iter().any(|ex| full.contains(ex)) {
                continue;
            }
            out.push((full.clone(), "relation".to_string()));
            out.push((format!("{full}__count"), "count".to_string()));

            if stack.len() >= stack_limit || stack.contains(name) {
                continue;
            }
            stack.push(name.clone());
            child.walk_fields(&full, stack, stack_limit, excludes, out);
            stack.pop();
        }
    }

    /// Flat list of every path, for "did you mean" suggestions.
    pub fn all_paths(&self) -> Vec<String> {
        self.simple_fields(DEFAULT_STACK_LIMIT, &[])
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn recipients() -> Vec<Recipient> {
        vec![
            Recipient::new(1, "a@test.com")
                .with_field("joined_at", FieldValue::DateTime(chrono::Utc::now()))
                .with_field("score", 3i64)
                .with_relation("profile", vec![Record::new().with_field("credits", 0i64)]),
            Recipient::new(2, "b@test.com")
                .with_field("score", 2.5)
                .with_field("nickname", FieldValue::Null),
        ]
    }

    #[test]
    fn infer_merges_kinds() {
        let schema = FieldSchema::infer(&recipients());
        assert_eq!(schema.fields["score"], FieldKind::Float);
        assert_eq!(schema.fields["joined_at"], FieldKind::DateTime);
        assert_eq!(schema.fields["id"], FieldKind::Int);
        assert!(!schema.fields.contains_key("nickname"));
        assert_eq!(
            schema.entry(&FieldPath::parse("nickname").unwrap()),
            Some(SchemaEntry::Untyped)
        );
    }

    #[test]
    fn null_then_typed_value_is_typed() {
        let schema = FieldSchema::infer(&[
            Recipient::new(1, "a@test.com").with_field("last_login", FieldValue::Null),
            Recipient::new(2, "b@test.com")
                .with_field("last_login", FieldValue::DateTime(chrono::Utc::now())),
        ]);
        assert_eq!(schema.fields["last_login"], FieldKind::DateTime);
        assert!(schema.untyped.is_empty());
    }

    #[test]
    fn declared_schema_overrides_observation() {
        let declared = FieldSchema::default()
            .with_field("nickname", FieldKind::Text)
            .with_field("last_login", FieldKind::DateTime)
            .with_relation("orders", FieldSchema::default().with_field("total", FieldKind::Float));
        let schema = FieldSchema::infer(&recipients()).merged_with(&declared);
        let p = |s: &str| FieldPath::parse(s).unwrap();
        assert_eq!(schema.entry(&p("nickname")), Some(SchemaEntry::Field(FieldKind::Text)));
        assert_eq!(
            schema.entry(&p("last_login")),
            Some(SchemaEntry::Field(FieldKind::DateTime))
        );
        assert_eq!(
            schema.entry(&p("orders__total")),
            Some(SchemaEntry::Field(FieldKind::Float))
        );
        assert_eq!(schema.entry(&p("profile__credits")), Some(SchemaEntry::Field(FieldKind::Int)));
    }

    #[test]
    fn directory_document_forms() {
        let rows: DirectoryDocument =
            serde_json::from_str(r#"[{"id": 1, "email": "a@test.com"}]"#).unwrap();
        let (schema, recipients) = rows.into_parts();
        assert!(schema.is_none());
        assert_eq!(recipients.len(), 1);

        let declared: DirectoryDocument = serde_json::from_str(
            r#"{"schema": {"fields": {"joined_at": "datetime"},
                           "relations": {"orders": {"fields": {"total": "float"}}}},
                "recipients": []}"#,
        )
        .unwrap();
        let (schema, recipients) = declared.into_parts();
        let schema = schema.unwrap();
        assert!(recipients.is_empty());
        assert_eq!(schema.fields["joined_at"], FieldKind::DateTime);
        assert_eq!(schema.relations["orders"].fields["total"], FieldKind::Float);
    }

    #[test]
    fn entry_resolves_fields_and_relations() {
        let schema = FieldSchema::infer(&recipients());
        let p = |s: &str| FieldPath::parse(s).unwrap();
        assert_eq!(
            schema.entry(&p("profile.credits")),
            Some(SchemaEntry::Field(FieldKind::Int))
        );
        assert_eq!(schema.entry(&p("profile")), Some(SchemaEntry::Relation));
        assert_eq!(schema.entry(&p("date__joined")), None);
    }

    #[test]
    fn simple_fields_lists_relations_and_counts() {
        let schema = FieldSchema::infer(&recipients());
        let fields = schema.simple_fields(DEFAULT_STACK_LIMIT, DEFAULT_EXCLUDES);
        let names: Vec<&str> = fields.iter().map(|(p, _)| p.as_str()).collect();
        assert!(names.contains(&"profile__credits"));
        assert!(names.contains(&"profile__count"));
        assert!(names.contains(&"joined_at"));
    }

    #[test]
    fn simple_fields_respects_stack_limit() {
        let deep = FieldSchema::default().with_field("leaf", FieldKind::Int);
        let schema = FieldSchema::recipient_base().with_relation(
            "a",
            FieldSchema::default().with_relation("b", FieldSchema::default().with_relation("c", deep)),
        );
        let names: Vec<String> = schema
            .simple_fields(2, &[])
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert!(names.contains(&"a__b__c".to_string()));
        assert!(!names.iter().any(|p| p == "a__b__c__leaf"));
    }
}
