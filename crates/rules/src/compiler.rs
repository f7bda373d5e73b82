//! Rule set compiler: turns a campaign's ordered rules into one narrowed
//! recipient collection.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::query::{Composition, Predicate, RecipientSet};
use crate::schema::{QueryRule, RuleMode};

pub struct RuleSetCompiler;

impl RuleSetCompiler {
    /// Apply `rules` to `base`.
    ///
    /// Count aggregations for every rule are attached first. Filter rules
    /// are ANDed together; exclude rules are ORed and subtracted in one
    /// pass. The result is deduplicated. An empty rule list keeps the whole
    /// base collection, and an empty base matches nobody whatever the rules.
    ///
    /// `now_fn` is read once, so every relative value in the rule set
    /// resolves against the same instant.
    pub fn compile<F>(base: RecipientSet, rules: &[QueryRule], now_fn: F) -> Result<RecipientSet>
    where
        F: Fn() -> DateTime<Utc>,
    {
        if base.is_empty() {
            debug!(rules = rules.len(), "empty recipient base; nothing to compile");
            return Ok(base);
        }
        let now = now_fn();
        let now_fn = move || now;

        let (filters, excludes): (Vec<&QueryRule>, Vec<&QueryRule>) =
            rules.iter().partition(|r| r.mode == RuleMode::Filter);

        let mut working = base;
        for rule in filters.iter().chain(excludes.iter()) {
            working = rule.apply_aggregation(working)?;
        }

        let filter = Composition::all(predicates(&filters, &now_fn)?);
        let exclude = Composition::any(predicates(&excludes, &now_fn)?);

        let total = working.len();
        if !exclude.is_empty() {
            working = working.exclude(&exclude)?;
        }
        let working = working.filter(&filter)?.distinct();

        debug!(
            filters = filters.len(),
            excludes = excludes.len(),
            total,
            matched = working.len(),
            "compiled rule set"
        );
        Ok(working)
    }
}

fn predicates<F>(rules: &[&QueryRule], now_fn: &F) -> Result<Vec<Predicate>>
where
    F: Fn() -> DateTime<Utc>,
{
    rules.iter().map(|rule| rule.predicate(now_fn)).collect()
}
