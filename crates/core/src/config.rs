use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

/// Registry alias every deployment must resolve.
pub const DEFAULT_MESSAGE_CLASS: &str = "default";

/// Builder kind the `default` alias maps to unless overridden.
pub const DEFAULT_MESSAGE_KIND: &str = "multipart";

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub mail: MailConfig,
    pub smtp: SmtpConfig,
    pub paths: PathsConfig,
    /// Message-builder alias → builder kind (`default` → `multipart`).
    pub message_classes: BTreeMap<String, String>,
}

impl Config {
    /// Build config for a named profile (empty string = default). Call
    /// `load_dotenv()` first. With a profile such as `PROD`, every key is
    /// looked up as `{PROFILE}_{KEY}` before falling back to `{KEY}`.
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let classes = profiled_env_opt(p, "DRIP_MESSAGE_CLASSES").unwrap_or_default();
        Self {
            profile: p.to_string(),
            mail: MailConfig::from_env_profiled(p),
            smtp: SmtpConfig::from_env_profiled(p),
            paths: PathsConfig::from_env_profiled(p),
            message_classes: parse_message_classes(&classes),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Log the redacted summary at startup.
    pub fn log_summary(&self) {
        tracing::info!(
            profile = self.profile_label(),
            config = %self.redacted_summary(),
            "config loaded"
        );
    }

    /// Return a redacted view safe for reports (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "mail": { "from_email": self.mail.from_email, "from_name": self.mail.from_name },
            "smtp": {
                "host": self.smtp.host,
                "port": self.smtp.port,
                "tls": self.smtp.tls,
                "configured": self.smtp.is_configured(),
                "authenticated": self.smtp.username.is_some(),
            },
            "paths": {
                "campaigns_dir": self.paths.campaigns_dir,
                "recipients_file": self.paths.recipients_file,
                "sent_log": self.paths.sent_log,
            },
            "message_classes": self.message_classes,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            mail: MailConfig::default(),
            smtp: SmtpConfig::default(),
            paths: PathsConfig::default(),
            message_classes: parse_message_classes(""),
        }
    }
}

/// Parse `alias=kind,alias=kind`. The `default` alias is always present.
/// Malformed entries are skipped with a warning.
pub fn parse_message_classes(raw: &str) -> BTreeMap<String, String> {
    let mut classes = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((alias, kind)) if !alias.trim().is_empty() && !kind.trim().is_empty() => {
                classes.insert(alias.trim().to_string(), kind.trim().to_string());
            }
            _ => tracing::warn!(entry, "ignoring malformed DRIP_MESSAGE_CLASSES entry"),
        }
    }
    classes
        .entry(DEFAULT_MESSAGE_CLASS.to_string())
        .or_insert_with(|| DEFAULT_MESSAGE_KIND.to_string());
    classes
}

// ── Mail ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Sender used when a campaign has no custom from address.
    pub from_email: String,
    /// Optional display name applied to `from_email`.
    pub from_name: Option<String>,
}

impl MailConfig {
    fn from_env_profiled(p: &str) -> Self {
        let fallback = profiled_env_or(p, "DEFAULT_FROM_EMAIL", "webmaster@localhost");
        Self {
            from_email: profiled_env_or(p, "DRIP_FROM_EMAIL", &fallback),
            from_name: profiled_env_opt(p, "DRIP_FROM_NAME"),
        }
    }

    /// `"Name <addr>"` when a name is configured, otherwise the bare address.
    pub fn default_sender(&self) -> String {
        match &self.from_name {
            Some(name) => format!("{} <{}>", name, self.from_email),
            None => self.from_email.clone(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_email: "webmaster@localhost".to_string(),
            from_name: None,
        }
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub tls: bool,
    #[serde(skip_serializing)]
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl SmtpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_opt(p, "SMTP_HOST"),
            port: profiled_env_u16(p, "SMTP_PORT", 587),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
            username: profiled_env_opt(p, "SMTP_USERNAME"),
            password: profiled_env_opt(p, "SMTP_PASSWORD"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            tls: true,
            username: None,
            password: None,
        }
    }
}

// ── Paths ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub campaigns_dir: PathBuf,
    pub recipients_file: PathBuf,
    pub sent_log: PathBuf,
}

impl PathsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            campaigns_dir: PathBuf::from(profiled_env_or(p, "DRIP_CAMPAIGNS_DIR", "data/drips")),
            recipients_file: PathBuf::from(profiled_env_or(
                p,
                "DRIP_RECIPIENTS_FILE",
                "data/recipients.json",
            )),
            sent_log: PathBuf::from(profiled_env_or(p, "DRIP_SENT_LOG", "data/sent_drips.jsonl")),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            campaigns_dir: PathBuf::from("data/drips"),
            recipients_file: PathBuf::from("data/recipients.json"),
            sent_log: PathBuf::from("data/sent_drips.jsonl"),
        }
    }
}
