//! Query layer over the in-memory recipient directory.
//!
//! Rules compile into tagged [`Predicate`] values, combined into
//! [`Composition`] trees and applied to a [`RecipientSet`].

mod collection;
mod composition;
mod predicate;

pub use collection::RecipientSet;
pub use composition::{CompiledComposition, Composition, Condition, LogicalOperator};
pub use predicate::{CompiledPredicate, Operand, Predicate, RuleValue};
