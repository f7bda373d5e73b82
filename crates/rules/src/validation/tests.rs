use chrono::Utc;
use drip_core::{FieldPath, Recipient, Record};

use super::*;
use crate::schema::{LookupType, QueryRule};

const CLASSES: &[&str] = &["default", "plain"];

fn sample() -> RecipientSet {
    RecipientSet::from_recipients(vec![Recipient::new(1, "a@test.com")
        .with_field("joined_at", Utc::now())
        .with_field("is_staff", false)
        .with_relation("profile", vec![Record::new().with_field("credits", 3i64)])
        .with_relation("sent_drips", vec![])])
}

fn rule(field: &str, lookup: LookupType, value: &str) -> QueryRule {
    QueryRule::new(FieldPath::parse(field).unwrap(), lookup, value)
}

fn campaign() -> Campaign {
    Campaign::new("a-week-ago", "Hi {{ user.email }}", "<p>Hello</p>")
        .with_rule(rule("joined_at", LookupType::Lt, "now-7 days"))
        .with_rule(rule("sent_drips__count", LookupType::Exact, "0"))
        .with_rule(rule("is_staff", LookupType::Exact, "True").exclude())
}

#[test]
fn valid_campaign_passes() {
    let result = validate_campaign(&campaign(), &sample(), CLASSES);
    assert!(result.valid, "unexpected errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn unknown_field_suggests_close_match() {
    let campaign = campaign().with_rule(rule("profile.credit", LookupType::Gte, "1"));
    let result = validate_campaign(&campaign, &sample(), CLASSES);
    assert!(!result.valid);
    let err = &result.errors[0];
    assert_eq!(err.path, "spec.rules[3].field");
    assert_eq!(err.suggestion.as_deref(), Some("Did you mean 'profile__credits'?"));
}

#[test]
fn bad_rule_value_is_wrapped() {
    let campaign = campaign().with_rule(rule("joined_at", LookupType::Gte, "now-8 dayz"));
    let result = validate_campaign(&campaign, &sample(), CLASSES);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, "spec.rules[3].value");
    assert!(result.errors[0]
        .message
        .starts_with("DurationError raised trying to apply rule"));
}

#[test]
fn unknown_message_class() {
    let mut campaign = campaign();
    campaign.spec.message_class = "defualt".to_string();
    let result = validate_campaign(&campaign, &sample(), CLASSES);
    assert!(!result.valid);
    assert_eq!(result.errors[0].path, "spec.message_class");
    assert_eq!(
        result.errors[0].suggestion.as_deref(),
        Some("Did you mean 'default'?")
    );
}

#[test]
fn sender_and_header_checks() {
    let mut campaign = campaign().with_sender("not-an-address", None);
    campaign.kind = "Newsletter".to_string();
    campaign.metadata.name = "A Week Ago".to_string();
    let result = validate_campaign(&campaign, &sample(), CLASSES);
    let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["kind", "spec.from_email"]);
    assert_eq!(result.warnings[0].path, "metadata.name");
}

#[test]
fn empty_rules_warn() {
    let campaign = Campaign::new("everyone", "Hi", "Body");
    let result = validate_campaign(&campaign, &sample(), CLASSES);
    assert!(result.valid);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].path, "spec.rules");
}

#[test]
fn yaml_parse_error() {
    let result = validate_yaml("metadata: [", &sample(), CLASSES);
    assert!(!result.valid);
    assert!(result.errors[0].message.starts_with("YAML parse error"));
}
