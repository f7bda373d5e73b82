//! Day-by-day audience preview.

use std::collections::HashSet;

use chrono::NaiveDate;
use drip_core::Recipient;
use serde::Serialize;

use crate::drip::Drip;
use crate::error::Result;

/// Recipients that would first receive the campaign on one day.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineDay {
    /// Whole days relative to today.
    pub offset: i64,
    pub date: NaiveDate,
    pub recipients: Vec<Recipient>,
}

/// Widest preview window on either side of today.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Preview `into_past` days back through `into_future` days ahead,
/// both ends inclusive and each capped at [`MAX_WINDOW_DAYS`]. Each day
/// lists only recipients not already listed on an earlier day and not
/// already notified.
pub fn timeline(drip: &Drip, into_past: u32, into_future: u32) -> Result<Vec<TimelineDay>> {
    let into_past = into_past.min(MAX_WINDOW_DAYS);
    let into_future = into_future.min(MAX_WINDOW_DAYS);
    let mut seen = HashSet::new();
    let mut days = Vec::new();
    for mut copy in drip.walk(into_past, into_future.saturating_add(1)) {
        copy.prune()?;
        let offset = copy.time_shift().num_days();
        let date = copy.now().date_naive();
        let recipients = copy
            .audience()?
            .iter()
            .filter(|r| seen.insert(r.id))
            .cloned()
            .collect();
        days.push(TimelineDay {
            offset,
            date,
            recipients,
        });
    }
    Ok(days)
}
