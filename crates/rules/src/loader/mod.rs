//! Filesystem campaign loader.
//!
//! Scans the campaigns directory for YAML `kind: Drip` documents and keeps
//! them in an in-memory map keyed by campaign name.

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::CampaignLoader;
pub use self::error::{LoadResult, LoadStatus};
