//! Drip campaign rule engine.
//!
//! This crate provides:
//! - YAML campaign definitions with serde deserialization
//! - Human-readable interval parsing for `now-7 days` style rule values
//! - A predicate/collection query layer over recipients
//! - Rule resolution, count aggregation and the rule set compiler
//! - Filesystem campaign loader and campaign validation

pub mod compiler;
pub mod duration;
pub mod error;
pub mod loader;
pub mod query;
pub mod rule;
pub mod schema;
pub mod validation;

pub use compiler::RuleSetCompiler;
pub use error::{Result, RuleError};
pub use query::RecipientSet;
pub use schema::{Campaign, CampaignMetadata, CampaignSpec, LookupType, QueryRule, RuleMode};
