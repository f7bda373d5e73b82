//! Boolean composition of predicates with AND/OR tree support.
//!
//! Interior nodes combine children with AND or OR; leaves are field
//! predicates. A tree is compiled against a schema once and then evaluated
//! per recipient.

use drip_core::{FieldSchema, Recipient};
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::predicate::{CompiledPredicate, Predicate};

/// Logical operators for predicate composition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Boolean composition tree over field predicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Composition {
    pub operator: LogicalOperator,
    pub conditions: Vec<Condition>,
}

/// A predicate leaf or nested composition node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Condition {
    Predicate(Predicate),
    Nested(Composition),
}

impl Composition {
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            operator: LogicalOperator::And,
            conditions: predicates.into_iter().map(Condition::Predicate).collect(),
        }
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            operator: LogicalOperator::Or,
            conditions: predicates.into_iter().map(Condition::Predicate).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Compile every leaf against `schema`. Fails on the first invalid leaf.
    pub fn compile(&self, schema: &FieldSchema) -> Result<CompiledComposition> {
        let conditions = self
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Predicate(p) => p.compile(schema).map(CompiledCondition::Predicate),
                Condition::Nested(n) => n.compile(schema).map(CompiledCondition::Nested),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledComposition {
            operator: self.operator,
            conditions,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledComposition {
    operator: LogicalOperator,
    conditions: Vec<CompiledCondition>,
}

#[derive(Debug, Clone)]
enum CompiledCondition {
    Predicate(CompiledPredicate),
    Nested(CompiledComposition),
}

impl CompiledComposition {
    /// Evaluate the tree for one recipient. An empty AND is true, an empty
    /// OR is false.
    pub fn matches(&self, recipient: &Recipient) -> bool {
        match self.operator {
            LogicalOperator::And => self.conditions.iter().all(|c| c.matches(recipient)),
            LogicalOperator::Or => self.conditions.iter().any(|c| c.matches(recipient)),
        }
    }
}

impl CompiledCondition {
    fn matches(&self, recipient: &Recipient) -> bool {
        match self {
            CompiledCondition::Predicate(p) => p.matches(recipient),
            CompiledCondition::Nested(n) => n.matches(recipient),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RuleValue;
    use crate::schema::LookupType;
    use drip_core::FieldPath;

    fn pred(field: &str, lookup: LookupType, value: &str) -> Predicate {
        Predicate::new(
            FieldPath::parse(field).unwrap(),
            lookup,
            RuleValue::Literal(value.to_string()),
        )
    }

    fn people() -> Vec<Recipient> {
        (1..=4)
            .map(|i| Recipient::new(i, format!("p{i}@test.com")).with_field("rank", i))
            .collect()
    }

    fn matching(composition: &Composition) -> Vec<i64> {
        let people = people();
        let compiled = composition.compile(&FieldSchema::infer(&people)).unwrap();
        people
            .iter()
            .filter(|r| compiled.matches(r))
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn and_or() {
        let and = Composition::all([
            pred("rank", LookupType::Gt, "1"),
            pred("rank", LookupType::Lt, "4"),
        ]);
        assert_eq!(matching(&and), vec![2, 3]);

        let or = Composition::any([
            pred("rank", LookupType::Exact, "1"),
            pred("rank", LookupType::Exact, "4"),
        ]);
        assert_eq!(matching(&or), vec![1, 4]);
    }

    #[test]
    fn empty_compositions() {
        assert_eq!(matching(&Composition::all([])).len(), 4);
        assert!(matching(&Composition::any([])).is_empty());
    }

    #[test]
    fn nested_tree_deserializes() {
        let json = r#"{
            "operator": "or",
            "conditions": [
                {"field": "rank", "lookup": "exact", "value": {"type": "literal", "value": "1"}},
                {"operator": "and", "conditions": [
                    {"field": "rank", "lookup": "gte", "value": {"type": "literal", "value": "3"}},
                    {"field": "email", "lookup": "startswith", "value": {"type": "literal", "value": "p4"}}
                ]}
            ]
        }"#;
        let composition: Composition = serde_json::from_str(json).unwrap();
        assert_eq!(matching(&composition), vec![1, 4]);
    }
}
