//! User directory: the recipient universe campaigns select from.

use std::path::Path;

use drip_core::{DirectoryDocument, FieldSchema, Recipient, RecipientId};
use drip_rules::RecipientSet;
use tracing::info;

use crate::error::Result;

pub trait RecipientDirectory: Send + Sync {
    /// Every recipient, with the schema rules are checked against.
    fn all(&self) -> Result<RecipientSet>;

    fn get(&self, id: RecipientId) -> Result<Option<Recipient>>;
}

/// Recipients held in memory, typically loaded from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    schema: FieldSchema,
    recipients: Vec<Recipient>,
}

impl MemoryDirectory {
    /// Infers the schema from the recipients themselves.
    pub fn new(recipients: Vec<Recipient>) -> Self {
        let schema = FieldSchema::infer(&recipients);
        Self { schema, recipients }
    }

    /// Lay a declared schema over what the rows show, so fields that are
    /// empty or null in the current data still resolve with their kind.
    pub fn with_schema(schema: FieldSchema, recipients: Vec<Recipient>) -> Self {
        let schema = FieldSchema::infer(&recipients).merged_with(&schema);
        Self { schema, recipients }
    }

    /// Load a [`DirectoryDocument`]: a bare recipient array, or
    /// `{"schema": ..., "recipients": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let document: DirectoryDocument = serde_json::from_str(&raw)?;
        let directory = match document.into_parts() {
            (Some(schema), recipients) => Self::with_schema(schema, recipients),
            (None, recipients) => Self::new(recipients),
        };
        info!(
            path = %path.display(),
            count = directory.len(),
            fields = directory.schema.fields.len(),
            "loaded recipients"
        );
        Ok(directory)
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}

impl RecipientDirectory for MemoryDirectory {
    fn all(&self) -> Result<RecipientSet> {
        Ok(RecipientSet::new(self.schema.clone(), self.recipients.clone()))
    }

    fn get(&self, id: RecipientId) -> Result<Option<Recipient>> {
        Ok(self.recipients.iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drip_core::{FieldKind, FieldPath, FieldValue, Record, SchemaEntry};

    #[test]
    fn loads_json_and_infers_relations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipients.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "email": "a@example.com", "fields": {"username": "ann"},
                 "relations": {"purchases": [{"id": 10, "fields": {"total": 5}}]}},
                {"id": 2, "email": "b@example.com", "fields": {"username": "bob"}}
            ]"#,
        )
        .unwrap();

        let directory = MemoryDirectory::from_json_file(&path).unwrap();
        assert_eq!(directory.len(), 2);
        assert!(directory
            .schema()
            .entry(&FieldPath::parse("purchases.total").unwrap())
            .is_some());
        assert_eq!(directory.get(2).unwrap().unwrap().email, "b@example.com");
        assert!(directory.get(3).unwrap().is_none());
    }

    #[test]
    fn declared_schema_resolves_fields_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipients.json");
        std::fs::write(
            &path,
            r#"{"schema": {"fields": {"joined_at": "datetime"},
                           "relations": {"purchases": {"fields": {"total": "float"}}}},
                "recipients": []}"#,
        )
        .unwrap();

        let directory = MemoryDirectory::from_json_file(&path).unwrap();
        assert!(directory.is_empty());
        let schema = directory.schema();
        assert_eq!(
            schema.entry(&FieldPath::parse("joined_at").unwrap()),
            Some(SchemaEntry::Field(FieldKind::DateTime))
        );
        assert_eq!(
            schema.entry(&FieldPath::parse("purchases").unwrap()),
            Some(SchemaEntry::Relation)
        );
    }

    #[test]
    fn declared_kind_types_an_all_null_field() {
        let directory = MemoryDirectory::with_schema(
            FieldSchema::default().with_field("last_login", FieldKind::DateTime),
            vec![Recipient::new(1, "a@example.com").with_field("last_login", FieldValue::Null)],
        );
        assert_eq!(
            directory.schema().entry(&FieldPath::parse("last_login").unwrap()),
            Some(SchemaEntry::Field(FieldKind::DateTime))
        );
    }

    #[test]
    fn all_returns_every_recipient() {
        let directory = MemoryDirectory::new(vec![
            Recipient::new(1, "a@example.com").with_relation("orders", vec![Record::new()]),
            Recipient::new(2, "b@example.com"),
        ]);
        let set = directory.all().unwrap();
        assert_eq!(set.ids(), vec![1, 2]);
    }
}
