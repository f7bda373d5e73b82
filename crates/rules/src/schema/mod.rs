//! YAML campaign schema types with serde deserialization.
//!
//! Defines the document hierarchy for drip campaigns:
//! - `Campaign`: the top-level `kind: Drip` document
//! - `CampaignMetadata`: identity and enabled flag
//! - `CampaignSpec`: sender, templates, message class and rules
//! - `QueryRule`: one field/lookup/value condition with a filter/exclude mode

mod campaign;
mod lookup;
mod metadata;
mod rule;

pub use campaign::*;
pub use lookup::*;
pub use metadata::*;
pub use rule::*;
