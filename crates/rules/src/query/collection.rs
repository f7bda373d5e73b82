//! In-memory recipient collection supporting the query operations a rule
//! set compiles into: filter, exclude, count annotation, distinct and id
//! projection.

use std::collections::{BTreeSet, HashSet};

use drip_core::{FieldKind, FieldPath, FieldSchema, FieldValue, Recipient, RecipientId, SchemaEntry};
use tracing::debug;

use crate::error::{Result, RuleError};

use super::composition::Composition;

/// A queryable set of recipients together with the schema used to check
/// predicates against it. Every operation consumes the set and returns the
/// narrowed one.
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    schema: FieldSchema,
    recipients: Vec<Recipient>,
}

impl RecipientSet {
    pub fn new(schema: FieldSchema, recipients: Vec<Recipient>) -> Self {
        Self { schema, recipients }
    }

    /// Build a set whose schema is inferred from the recipients themselves.
    pub fn from_recipients(recipients: Vec<Recipient>) -> Self {
        let schema = FieldSchema::infer(&recipients);
        Self { schema, recipients }
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

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.recipients.iter()
    }

    pub fn get(&self, id: RecipientId) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: RecipientId) -> bool {
        self.get(id).is_some()
    }

    /// Keep recipients matching `composition`.
    pub fn filter(self, composition: &Composition) -> Result<Self> {
        let compiled = composition.compile(&self.schema)?;
        let Self {
            schema,
            mut recipients,
        } = self;
        recipients.retain(|r| compiled.matches(r));
        Ok(Self { schema, recipients })
    }

    /// Drop recipients matching `composition`.
    pub fn exclude(self, composition: &Composition) -> Result<Self> {
        let compiled = composition.compile(&self.schema)?;
        let Self {
            schema,
            mut recipients,
        } = self;
        recipients.retain(|r| !compiled.matches(r));
        Ok(Self { schema, recipients })
    }

    /// Annotate every recipient with the distinct count of records reached
    /// through the relation path `relation`, stored under `name`.
    ///
    /// Related records with an id are counted once per id; records without
    /// one are each counted.
    pub fn annotate_count(self, name: &str, relation: &FieldPath) -> Result<Self> {
        match self.schema.entry(relation) {
            Some(SchemaEntry::Relation) => {}
            Some(SchemaEntry::Field(kind)) => {
                return Err(RuleError::Field(format!(
                    "cannot count `{relation}`: it is a {kind}, not a relation"
                )))
            }
            Some(SchemaEntry::Untyped) => {
                return Err(RuleError::Field(format!(
                    "cannot count `{relation}`: it is a field, not a relation"
                )))
            }
            None => {
                return Err(RuleError::Field(format!(
                    "cannot count `{relation}`: no such relation on recipient"
                )))
            }
        }

        let Self {
            mut schema,
            mut recipients,
        } = self;
        for recipient in &mut recipients {
            let count = distinct_count(recipient, relation);
            recipient.annotate(name, FieldValue::Int(count));
        }
        schema.annotate(name, FieldKind::Int);
        debug!(annotation = name, relation = %relation, "annotated relation count");
        Ok(Self { schema, recipients })
    }

    /// Remove repeated recipients, keeping the first occurrence of each id.
    pub fn distinct(self) -> Self {
        let Self { schema, recipients } = self;
        let mut seen = HashSet::new();
        let recipients = recipients
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .collect();
        Self { schema, recipients }
    }

    /// Recipient ids in collection order.
    pub fn ids(&self) -> Vec<RecipientId> {
        self.recipients.iter().map(|r| r.id).collect()
    }

    /// Drop every recipient whose id is in `ids`.
    pub fn without_ids(self, ids: &HashSet<RecipientId>) -> Self {
        let Self {
            schema,
            mut recipients,
        } = self;
        recipients.retain(|r| !ids.contains(&r.id));
        Self { schema, recipients }
    }

    pub fn into_vec(self) -> Vec<Recipient> {
        self.recipients
    }
}

fn distinct_count(recipient: &Recipient, relation: &FieldPath) -> i64 {
    let mut ids = BTreeSet::new();
    let mut anonymous = 0i64;
    for record in recipient.related_at(relation) {
        match record.id {
            Some(id) => {
                ids.insert(id);
            }
            None => anonymous += 1,
        }
    }
    ids.len() as i64 + anonymous
}

impl IntoIterator for RecipientSet {
    type Item = Recipient;
    type IntoIter = std::vec::IntoIter<Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecipientSet {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Predicate, RuleValue};
    use crate::schema::LookupType;
    use drip_core::Record;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    fn shoppers() -> RecipientSet {
        let orders = |ids: &[i64]| -> Vec<Record> { ids.iter().map(|id| Record::new().with_id(*id)).collect() };
        RecipientSet::from_recipients(vec![
            Recipient::new(1, "a@test.com").with_relation("orders", orders(&[10, 11])),
            // same order reached twice through a join fan-out
            Recipient::new(2, "b@test.com").with_relation("orders", orders(&[12, 12])),
            Recipient::new(3, "c@test.com").with_relation("orders", vec![]),
            Recipient::new(4, "d@test.com").with_relation(
                "orders",
                vec![Record::new(), Record::new().with_field("total", 3i64)],
            ),
        ])
    }

    #[test]
    fn annotate_count_is_distinct() {
        let set = shoppers()
            .annotate_count("num_orders", &path("orders"))
            .unwrap();
        let counts: Vec<_> = set
            .iter()
            .map(|r| r.field("num_orders").unwrap())
            .collect();
        assert_eq!(
            counts,
            vec![
                FieldValue::Int(2),
                FieldValue::Int(1),
                FieldValue::Int(0),
                FieldValue::Int(2)
            ]
        );
        assert_eq!(
            set.schema().entry(&path("num_orders")),
            Some(SchemaEntry::Field(FieldKind::Int))
        );
    }

    #[test]
    fn annotate_count_requires_a_relation() {
        let err = shoppers()
            .annotate_count("num_email", &path("email"))
            .unwrap_err();
        assert!(matches!(err, RuleError::Field(_)));
        let err = shoppers()
            .annotate_count("num_refunds", &path("refunds"))
            .unwrap_err();
        assert!(err.to_string().contains("no such relation"));
    }

    #[test]
    fn filter_then_exclude() {
        let zero = Composition::all([Predicate::new(
            path("num_orders"),
            LookupType::Exact,
            RuleValue::Literal("0".into()),
        )]);
        let set = shoppers()
            .annotate_count("num_orders", &path("orders"))
            .unwrap();
        assert_eq!(set.clone().filter(&zero).unwrap().ids(), vec![3]);
        assert_eq!(set.exclude(&zero).unwrap().ids(), vec![1, 2, 4]);
    }

    #[test]
    fn distinct_and_without_ids() {
        let mut recipients = shoppers().into_vec();
        recipients.push(Recipient::new(1, "a@test.com"));
        let set = RecipientSet::from_recipients(recipients);
        assert_eq!(set.len(), 5);

        let set = set.distinct();
        assert_eq!(set.ids(), vec![1, 2, 3, 4]);

        let sent: HashSet<_> = [2, 4].into_iter().collect();
        let set = set.without_ids(&sent);
        assert_eq!(set.ids(), vec![1, 3]);
        assert!(set.contains(3));
        assert!(!set.contains(2));
    }
}
