//! Apply-time operations on a [`QueryRule`]: value resolution, count
//! aggregation and design-time validation.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use drip_core::FieldPath;
use tracing::debug;

use crate::duration;
use crate::error::{Result, RuleError};
use crate::query::{Composition, Predicate, RecipientSet, RuleValue};
use crate::schema::{QueryRule, RuleMode};

/// Prefix marking a reference to another field of the same recipient.
pub const FIELD_REF_PREFIX: &str = "F_";

/// Prefix of synthesized count-annotation names.
pub const COUNT_ANNOTATION_PREFIX: &str = "num_";

#[derive(Clone, Copy)]
enum Anchor {
    Now,
    Today,
}

const RELATIVE_PREFIXES: [(&str, Anchor, i32); 4] = [
    ("now-", Anchor::Now, -1),
    ("now+", Anchor::Now, 1),
    ("today-", Anchor::Today, -1),
    ("today+", Anchor::Today, 1),
];

impl QueryRule {
    /// Resolve the raw value against the current time.
    ///
    /// `now±<duration>` and `today±<duration>` are checked first, then
    /// `F_<path>` field references, then the `True`/`False` literals.
    /// Anything else passes through as a literal for the comparison to
    /// coerce.
    pub fn resolve_value<F>(&self, now_fn: F) -> Result<RuleValue>
    where
        F: Fn() -> DateTime<Utc>,
    {
        let raw = self.value.as_str();

        for (prefix, anchor, sign) in RELATIVE_PREFIXES {
            let Some(interval) = raw.strip_prefix(prefix) else {
                continue;
            };
            let offset = duration::parse(interval)?;
            let now = now_fn();
            let base = match anchor {
                Anchor::Now => now,
                Anchor::Today => now.date_naive().and_time(NaiveTime::MIN).and_utc(),
            };
            return shift(base, offset, sign)
                .map(RuleValue::DateTime)
                .ok_or_else(|| RuleError::Duration(interval.trim().to_string()));
        }

        if let Some(path) = raw.strip_prefix(FIELD_REF_PREFIX) {
            return Ok(RuleValue::FieldRef(FieldPath::parse(path)?));
        }

        Ok(match raw {
            "True" => RuleValue::Bool(true),
            "False" => RuleValue::Bool(false),
            _ => RuleValue::Literal(raw.to_string()),
        })
    }

    /// Name the compiler filters on: `num_<relation>` for a count path such
    /// as `sent_drips__count`, the path itself otherwise.
    pub fn aggregated_field_name(&self) -> String {
        match self.field.count_target() {
            Some(target) => format!("{COUNT_ANNOTATION_PREFIX}{}", target.underscored()),
            None => self.field.as_str().to_string(),
        }
    }

    /// Attach the distinct-count annotation this rule asks for, if any.
    pub fn apply_aggregation(&self, set: RecipientSet) -> Result<RecipientSet> {
        match self.field.count_target() {
            Some(target) => set.annotate_count(&self.aggregated_field_name(), &target),
            None => Ok(set),
        }
    }

    /// The predicate this rule contributes, with its value resolved now.
    pub fn predicate<F>(&self, now_fn: F) -> Result<Predicate>
    where
        F: Fn() -> DateTime<Utc>,
    {
        let field = if self.field.is_count() {
            FieldPath::parse(&self.aggregated_field_name())?
        } else {
            self.field.clone()
        };
        Ok(Predicate::new(field, self.lookup, self.resolve_value(now_fn)?))
    }

    /// Trial-apply the rule to `sample`.
    ///
    /// # Errors
    ///
    /// Any failure (bad duration, unknown path, inapplicable lookup) comes
    /// back as [`RuleError::Validation`] carrying the cause's kind and
    /// message.
    pub fn validate(&self, sample: &RecipientSet) -> Result<()> {
        self.trial_apply(sample).map_err(RuleError::into_validation)
    }

    fn trial_apply(&self, sample: &RecipientSet) -> Result<()> {
        let set = self.apply_aggregation(sample.clone())?;
        let clause = Composition::all([self.predicate(Utc::now)?]);
        let remaining = match self.mode {
            RuleMode::Filter => set.filter(&clause)?,
            RuleMode::Exclude => set.exclude(&clause)?,
        };
        debug!(
            field = %self.field,
            lookup = %self.lookup,
            sample = sample.len(),
            remaining = remaining.len(),
            "rule trial application"
        );
        Ok(())
    }
}

fn shift(base: DateTime<Utc>, offset: Duration, sign: i32) -> Option<DateTime<Utc>> {
    if sign < 0 {
        base.checked_sub_signed(offset)
    } else {
        base.checked_add_signed(offset)
    }
}
