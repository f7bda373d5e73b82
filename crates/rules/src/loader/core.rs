//! Core [`CampaignLoader`] struct: filesystem-backed campaign loading.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::{Result, RuleError};
use crate::schema::{Campaign, CAMPAIGN_KIND};

use super::error::{LoadResult, LoadStatus};

/// Filesystem-backed campaign loader.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` files and
/// deserializes them into [`Campaign`] instances, keyed by
/// `metadata.name`. A name may only come from one file.
pub struct CampaignLoader {
    /// Root directory containing campaign YAML files.
    campaigns_dir: PathBuf,
    /// In-memory store of all campaigns keyed by name, in load order.
    campaigns: RwLock<IndexMap<String, Campaign>>,
    /// File each campaign name was loaded from.
    sources: RwLock<HashMap<String, PathBuf>>,
}

impl CampaignLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(campaigns_dir: PathBuf) -> Self {
        if !campaigns_dir.exists() {
            if let Err(e) = fs::create_dir_all(&campaigns_dir) {
                warn!(path = %campaigns_dir.display(), error = %e, "failed to create campaigns directory");
            }
        }
        Self {
            campaigns_dir,
            campaigns: RwLock::new(IndexMap::new()),
            sources: RwLock::new(HashMap::new()),
        }
    }

    /// Recursively scan the campaigns directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Entries are visited in
    /// file-name order. Parse errors and duplicate names are reported
    /// per-file but do not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.campaigns_dir, &mut results)?;
        let loaded = results.iter().filter(|r| r.is_loaded()).count();
        let failed = results.iter().filter(|r| r.is_failed()).count();
        info!(dir = %self.campaigns_dir.display(), loaded, failed, "campaign scan complete");
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path).and_then(|c| self.insert(&path, c)) {
                Ok(name) => {
                    info!(campaign = %name, path = %path.display(), "loaded campaign");
                    LoadStatus::Loaded { name }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load campaign file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse a single YAML file into a [`Campaign`].
    pub fn load_file(&self, path: &Path) -> Result<Campaign> {
        let contents = fs::read_to_string(path)?;
        let campaign = Campaign::from_yaml(&contents)?;

        if campaign.name().trim().is_empty() {
            return Err(schema_error("campaign metadata.name must not be empty"));
        }
        if campaign.kind != CAMPAIGN_KIND {
            return Err(schema_error(format!(
                "campaign '{}' has kind '{}', expected '{CAMPAIGN_KIND}'",
                campaign.name(),
                campaign.kind
            )));
        }
        Ok(campaign)
    }

    fn insert(&self, path: &Path, campaign: Campaign) -> Result<String> {
        let name = campaign.name().to_string();
        {
            let mut sources = self.sources.write().expect("sources lock poisoned");
            match sources.get(&name) {
                Some(existing) if existing != path => {
                    return Err(RuleError::Duplicate(format!(
                        "'{name}' already loaded from {}",
                        existing.display()
                    )));
                }
                _ => {
                    sources.insert(name.clone(), path.to_path_buf());
                }
            }
        }
        self.campaigns
            .write()
            .expect("campaigns lock poisoned")
            .insert(name.clone(), campaign);
        Ok(name)
    }

    /// Look up one campaign by name.
    pub fn get(&self, name: &str) -> Option<Campaign> {
        self.campaigns
            .read()
            .expect("campaigns lock poisoned")
            .get(name)
            .cloned()
    }

    /// Every loaded campaign, sorted by name.
    pub fn all(&self) -> Vec<Campaign> {
        let mut all: Vec<Campaign> = self
            .campaigns
            .read()
            .expect("campaigns lock poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Enabled campaigns, sorted by name.
    pub fn enabled(&self) -> Vec<Campaign> {
        self.all().into_iter().filter(Campaign::enabled).collect()
    }
}

fn schema_error(message: impl Into<String>) -> RuleError {
    RuleError::Validation {
        kind: "SchemaError".to_string(),
        message: message.into(),
    }
}
