//! Per-rule trial application against a sample collection.

use drip_core::FieldPath;

use crate::query::RecipientSet;
use crate::schema::{Campaign, RuleMode};

use super::fuzzy::fuzzy_match;
use super::ValidationResult;

pub(super) fn validate_rules(
    campaign: &Campaign,
    sample: &RecipientSet,
    result: &mut ValidationResult,
) {
    let rules = campaign.rules();
    if rules.is_empty() {
        result.warn("spec.rules", "no rules: every recipient matches");
        return;
    }
    if rules.iter().all(|r| r.mode == RuleMode::Exclude) {
        result.warn(
            "spec.rules",
            "only exclude rules: every recipient not excluded matches",
        );
    }

    let known = sample.schema().all_paths();
    let known: Vec<&str> = known.iter().map(String::as_str).collect();

    for (i, rule) in rules.iter().enumerate() {
        let path = format!("spec.rules[{i}]");

        let lookup_path = rule.field.count_target().unwrap_or_else(|| rule.field.clone());
        if sample.schema().entry(&lookup_path).is_none() {
            unknown_field(&path, &rule.field, &known, result);
            continue;
        }

        if let Err(e) = rule.validate(sample) {
            result.error(format!("{path}.value"), e.to_string());
        }
    }
}

fn unknown_field(path: &str, field: &FieldPath, known: &[&str], result: &mut ValidationResult) {
    let underscored = field.segments().join("__");
    let message = format!("unknown field '{field}'");
    match fuzzy_match(&underscored, known) {
        Some(s) => result.error_with_suggestion(
            format!("{path}.field"),
            message,
            format!("Did you mean '{s}'?"),
        ),
        None => result.error(format!("{path}.field"), message),
    }
}
