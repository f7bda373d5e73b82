//! Batch run over every loaded campaign.

use drip_rules::Campaign;
use serde::Serialize;
use tracing::{error, info};

use crate::drip::{Drip, DripContext};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Disabled,
    Sent { count: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub campaign: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Run every campaign in name order. Disabled campaigns are reported and
/// left alone. A campaign failing with a configuration error is logged and
/// skipped; any other error aborts the batch.
pub fn run_enabled(campaigns: &[Campaign], ctx: &DripContext) -> Result<Vec<CampaignReport>> {
    let mut ordered: Vec<&Campaign> = campaigns.iter().collect();
    ordered.sort_by(|a, b| a.name().cmp(b.name()));

    let mut reports = Vec::with_capacity(ordered.len());
    for campaign in ordered {
        let mut drip = Drip::new(campaign.clone(), ctx.clone());
        let outcome = match drip.run() {
            Ok(None) => RunOutcome::Disabled,
            Ok(Some(count)) => RunOutcome::Sent { count },
            Err(e) if e.is_config() => {
                error!(campaign = %campaign.name(), error = %e, "campaign skipped");
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        reports.push(CampaignReport {
            campaign: campaign.name().to_string(),
            outcome,
        });
    }

    let sent: usize = reports
        .iter()
        .map(|r| match r.outcome {
            RunOutcome::Sent { count } => count,
            _ => 0,
        })
        .sum();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, RunOutcome::Failed { .. }))
        .count();
    info!(campaigns = reports.len(), sent, failed, "run complete");
    Ok(reports)
}
