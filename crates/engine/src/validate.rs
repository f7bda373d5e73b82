//! Campaign validation against the live directory and message registry.

use drip_notify::TemplateRenderer;
use drip_rules::validation::{validate_campaign as validate_definition, ValidationResult};
use drip_rules::Campaign;

use crate::drip::DripContext;
use crate::error::Result;

/// Document, sender, message-class and rule checks, plus a syntax check
/// of both templates. Rules are trial-applied to the whole directory.
pub fn validate_campaign(campaign: &Campaign, ctx: &DripContext) -> Result<ValidationResult> {
    let sample = ctx.directory.all()?;
    let aliases = ctx.registry.aliases();
    let mut result = validate_definition(campaign, &sample, &aliases);

    let renderer = TemplateRenderer::new();
    let templates = [
        ("spec.subject_template", &campaign.spec.subject_template),
        ("spec.body_template", &campaign.spec.body_template),
    ];
    for (path, template) in templates {
        if let Err(e) = renderer.validate(template) {
            result.error(path, e.to_string());
        }
    }
    Ok(result)
}

/// Validate each campaign, keyed by name.
pub fn validate_all(
    campaigns: &[Campaign],
    ctx: &DripContext,
) -> Result<Vec<(String, ValidationResult)>> {
    campaigns
        .iter()
        .map(|c| Ok((c.name().to_string(), validate_campaign(c, ctx)?)))
        .collect()
}
