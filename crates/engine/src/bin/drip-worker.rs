//! drip-worker: single-pass batch runner for drip campaigns.
//!
//! Loads campaign documents from `DRIP_CAMPAIGNS_DIR`, recipients from
//! `DRIP_RECIPIENTS_FILE` and delivery history from `DRIP_SENT_LOG`, then
//! performs one command and exits.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use drip_core::config::load_dotenv;
use drip_core::field_schema::{DEFAULT_EXCLUDES, DEFAULT_STACK_LIMIT};
use drip_core::Config;
use drip_engine::{
    run_enabled, timeline, validate_all, DeliveryStore, Drip, DripContext, JsonlDeliveryStore,
    MemoryDirectory, RecipientDirectory,
};
use drip_notify::{LogTransport, MailTransport, SmtpMailer};
use drip_rules::loader::{CampaignLoader, LoadStatus};

// ── CLI ─────────────────────────────────────────────────────────────

/// Drip campaign worker: send, preview and validate campaigns.
#[derive(Parser, Debug)]
#[command(name = "drip-worker", version, about)]
struct Cli {
    /// Configuration profile (overrides DRIP_PROFILE).
    #[arg(long, env = "DRIP_PROFILE", default_value = "")]
    profile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every enabled campaign once.
    Send {
        /// Log messages instead of delivering them; record nothing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show who would first receive a campaign on each day.
    Timeline {
        name: String,
        #[arg(long, default_value_t = 0)]
        past: u32,
        #[arg(long, default_value_t = 7)]
        future: u32,
    },
    /// Render the message one recipient would receive.
    Preview { name: String, recipient_id: i64 },
    /// Validate every campaign document.
    Validate,
    /// List queryable recipient field paths.
    Fields,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();
    let config = Config::for_profile(&cli.profile);
    config.log_summary();

    let directory = Arc::new(
        MemoryDirectory::from_json_file(&config.paths.recipients_file).with_context(|| {
            format!(
                "failed to load recipients from {}",
                config.paths.recipients_file.display()
            )
        })?,
    );

    if let Command::Fields = cli.command {
        for (path, kind) in directory
            .schema()
            .simple_fields(DEFAULT_STACK_LIMIT, DEFAULT_EXCLUDES)
        {
            println!("{path}\t{kind}");
        }
        return Ok(());
    }

    let loader = CampaignLoader::new(config.paths.campaigns_dir.clone());
    let results = loader.load_all().context("failed to scan campaigns directory")?;
    for result in &results {
        if let LoadStatus::Failed { error } = &result.status {
            warn!(path = %result.path.display(), error = %error, "campaign not loaded");
        }
    }
    info!(
        loaded = results.iter().filter(|r| r.is_loaded()).count(),
        failed = results.iter().filter(|r| r.is_failed()).count(),
        "campaigns scanned"
    );

    let dry_run = matches!(cli.command, Command::Send { dry_run: true });
    let store: Arc<dyn DeliveryStore> = if dry_run {
        Arc::new(JsonlDeliveryStore::open_read_only(&config.paths.sent_log))
    } else {
        Arc::new(JsonlDeliveryStore::open(&config.paths.sent_log))
    };
    let transport: Arc<dyn MailTransport> = if dry_run || !config.smtp.is_configured() {
        Arc::new(LogTransport)
    } else {
        Arc::new(SmtpMailer::from_config(&config.smtp).context("failed to build SMTP transport")?)
    };
    let directory: Arc<dyn RecipientDirectory> = directory;
    let ctx = DripContext::new(config, directory, store, transport);

    match cli.command {
        Command::Send { .. } => {
            if !dry_run && !ctx.config.smtp.is_configured() {
                bail!("SMTP_HOST is not set; configure SMTP or pass --dry-run");
            }
            let reports = run_enabled(&loader.all(), &ctx)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Timeline { name, past, future } => {
            let campaign = loader
                .get(&name)
                .with_context(|| format!("no campaign named '{name}'"))?;
            let drip = Drip::new(campaign, ctx);
            for day in timeline(&drip, past, future)? {
                let emails: Vec<&str> = day.recipients.iter().map(|r| r.email.as_str()).collect();
                println!("{:+} {} {}: {}", day.offset, day.date, emails.len(), emails.join(", "));
            }
        }
        Command::Preview { name, recipient_id } => {
            let campaign = loader
                .get(&name)
                .with_context(|| format!("no campaign named '{name}'"))?;
            let message = Drip::new(campaign, ctx).preview_message(recipient_id)?;
            println!("From: {}", message.from);
            println!("To: {}", message.to);
            println!("Subject: {}", message.subject);
            println!();
            println!("{}", message.preferred_body());
        }
        Command::Validate => {
            let mut invalid = 0;
            for (name, result) in validate_all(&loader.all(), &ctx)? {
                if !result.valid {
                    invalid += 1;
                }
                println!("{name}: {}", serde_json::to_string_pretty(&result)?);
            }
            if invalid > 0 {
                bail!("{invalid} campaign(s) failed validation");
            }
        }
        Command::Fields => {}
    }
    Ok(())
}
