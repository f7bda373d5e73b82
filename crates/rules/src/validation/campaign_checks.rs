//! Header, sender and message-class checks.

use crate::schema::{Campaign, CAMPAIGN_KIND};

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;

pub(super) fn validate_header(campaign: &Campaign, result: &mut ValidationResult) {
    if campaign.kind != CAMPAIGN_KIND {
        result.error(
            "kind",
            format!("unsupported kind '{}', expected '{CAMPAIGN_KIND}'", campaign.kind),
        );
    }
    if campaign.api_version != "v1" {
        result.warn(
            "apiVersion",
            format!("unknown apiVersion '{}', treating as v1", campaign.api_version),
        );
    }

    let name = campaign.name();
    if name.trim().is_empty() {
        result.error("metadata.name", "campaign name must not be empty");
    } else if !is_kebab_case(name) {
        result.warn(
            "metadata.name",
            format!("'{name}' is not kebab-case; file names and CLI arguments use the name verbatim"),
        );
    }
}

pub(super) fn validate_sender(campaign: &Campaign, result: &mut ValidationResult) {
    match campaign.spec.from_email.as_deref() {
        Some(addr) if !looks_like_address(addr) => {
            result.error(
                "spec.from_email",
                format!("'{addr}' is not an email address"),
            );
        }
        None if campaign.spec.from_email_name.is_some() => {
            result.warn(
                "spec.from_email_name",
                "from_email_name has no effect without from_email",
            );
        }
        _ => {}
    }
}

fn looks_like_address(addr: &str) -> bool {
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !addr.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub(super) fn validate_message(
    campaign: &Campaign,
    message_classes: &[&str],
    result: &mut ValidationResult,
) {
    let class = campaign.spec.message_class.as_str();
    if !message_classes.contains(&class) {
        let message = format!("unknown message class '{class}'");
        match fuzzy_match(class, message_classes) {
            Some(s) => result.error_with_suggestion(
                "spec.message_class",
                message,
                format!("Did you mean '{s}'?"),
            ),
            None => result.error("spec.message_class", message),
        }
    }

    if campaign.spec.subject_template.trim().is_empty() {
        result.error("spec.subject_template", "subject template must not be empty");
    }
    if campaign.spec.body_template.trim().is_empty() {
        result.warn("spec.body_template", "body template is empty");
    }
}
