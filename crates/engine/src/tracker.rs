//! Delivery tracker: one immutable [`SentDrip`] per successful send.
//!
//! Records are append-only. `already_sent` only counts records strictly
//! earlier than its `before` bound, so a record written during the current
//! run never narrows an audience snapshot taken at the start of it.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use drip_core::RecipientId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Proof that a recipient received a campaign's message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentDrip {
    pub id: Uuid,
    pub campaign: String,
    pub recipient_id: RecipientId,
    pub subject: String,
    pub body: String,
    pub from_email: String,
    pub sent_at: DateTime<Utc>,
}

impl SentDrip {
    pub fn new(
        campaign: impl Into<String>,
        recipient_id: RecipientId,
        subject: impl Into<String>,
        body: impl Into<String>,
        from_email: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign: campaign.into(),
            recipient_id,
            subject: subject.into(),
            body: body.into(),
            from_email: from_email.into(),
            sent_at,
        }
    }
}

pub trait DeliveryStore: Send + Sync {
    /// Append one record.
    fn record(&self, drip: SentDrip) -> Result<()>;

    /// Ids among `recipients` holding a record for `campaign` dated
    /// strictly before `before`.
    fn already_sent(
        &self,
        campaign: &str,
        recipients: &[RecipientId],
        before: DateTime<Utc>,
    ) -> Result<HashSet<RecipientId>>;

    /// Every record for `campaign`, oldest first.
    fn records(&self, campaign: &str) -> Result<Vec<SentDrip>>;

    /// Number of records, for one campaign or all of them.
    fn count(&self, campaign: Option<&str>) -> Result<usize>;
}

fn sent_before(
    records: &[SentDrip],
    campaign: &str,
    recipients: &[RecipientId],
    before: DateTime<Utc>,
) -> HashSet<RecipientId> {
    let wanted: HashSet<RecipientId> = recipients.iter().copied().collect();
    records
        .iter()
        .filter(|r| r.campaign == campaign && r.sent_at < before && wanted.contains(&r.recipient_id))
        .map(|r| r.recipient_id)
        .collect()
}

// ── In-memory ──────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct MemoryDeliveryStore {
    records: Arc<RwLock<Vec<SentDrip>>>,
}

impl MemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<SentDrip> {
        self.records.read().expect("delivery store lock poisoned").clone()
    }
}

impl DeliveryStore for MemoryDeliveryStore {
    fn record(&self, drip: SentDrip) -> Result<()> {
        self.records
            .write()
            .expect("delivery store lock poisoned")
            .push(drip);
        Ok(())
    }

    fn already_sent(
        &self,
        campaign: &str,
        recipients: &[RecipientId],
        before: DateTime<Utc>,
    ) -> Result<HashSet<RecipientId>> {
        let guard = self.records.read().expect("delivery store lock poisoned");
        Ok(sent_before(&guard, campaign, recipients, before))
    }

    fn records(&self, campaign: &str) -> Result<Vec<SentDrip>> {
        let guard = self.records.read().expect("delivery store lock poisoned");
        Ok(guard.iter().filter(|r| r.campaign == campaign).cloned().collect())
    }

    fn count(&self, campaign: Option<&str>) -> Result<usize> {
        let guard = self.records.read().expect("delivery store lock poisoned");
        Ok(match campaign {
            Some(name) => guard.iter().filter(|r| r.campaign == name).count(),
            None => guard.len(),
        })
    }
}

// ── JSON Lines file ────────────────────────────────────────────

/// One JSON record per line. A read-only store answers queries from the
/// file but drops writes.
#[derive(Debug)]
pub struct JsonlDeliveryStore {
    path: PathBuf,
    read_only: bool,
}

impl JsonlDeliveryStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    pub fn open_read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<SentDrip>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut records = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                EngineError::Store(format!("{}:{}: {e}", self.path.display(), n + 1))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl DeliveryStore for JsonlDeliveryStore {
    fn record(&self, drip: SentDrip) -> Result<()> {
        if self.read_only {
            debug!(campaign = %drip.campaign, recipient_id = drip.recipient_id, "read-only store, record dropped");
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut line = serde_json::to_string(&drip)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes()).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to append delivery record");
            EngineError::Io(e)
        })
    }

    fn already_sent(
        &self,
        campaign: &str,
        recipients: &[RecipientId],
        before: DateTime<Utc>,
    ) -> Result<HashSet<RecipientId>> {
        Ok(sent_before(&self.load()?, campaign, recipients, before))
    }

    fn records(&self, campaign: &str) -> Result<Vec<SentDrip>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.campaign == campaign)
            .collect())
    }

    fn count(&self, campaign: Option<&str>) -> Result<usize> {
        let records = self.load()?;
        Ok(match campaign {
            Some(name) => records.iter().filter(|r| r.campaign == name).count(),
            None => records.len(),
        })
    }
}
