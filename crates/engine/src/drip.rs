//! Runtime campaign.
//!
//! A [`Drip`] pairs a loaded [`Campaign`] with the collaborators it runs
//! against and a `time_shift` applied to "now". The audience is computed
//! once per instance and narrowed in place by [`Drip::prune`]; a fresh
//! instance starts from an empty memo.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use drip_core::{Config, RecipientId};
use drip_notify::{MailTransport, MessageBuilder, MessageRegistry, MessageTemplate, OutgoingMessage};
use drip_rules::{Campaign, RecipientSet, RuleSetCompiler};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::directory::RecipientDirectory;
use crate::error::{EngineError, Result};
use crate::tracker::{DeliveryStore, SentDrip};

/// Collaborators shared by every campaign of a run.
#[derive(Clone)]
pub struct DripContext {
    pub config: Arc<Config>,
    pub registry: MessageRegistry,
    pub directory: Arc<dyn RecipientDirectory>,
    pub store: Arc<dyn DeliveryStore>,
    pub transport: Arc<dyn MailTransport>,
    pub clock: Arc<dyn Clock>,
}

impl DripContext {
    pub fn new(
        config: Config,
        directory: Arc<dyn RecipientDirectory>,
        store: Arc<dyn DeliveryStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let registry = MessageRegistry::from_config(&config);
        Self {
            config: Arc::new(config),
            registry,
            directory,
            store,
            transport,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

pub struct Drip {
    campaign: Arc<Campaign>,
    ctx: DripContext,
    time_shift: Duration,
    audience: Option<RecipientSet>,
    preview: bool,
}

impl Drip {
    pub fn new(campaign: Campaign, ctx: DripContext) -> Self {
        Self {
            campaign: Arc::new(campaign),
            ctx,
            time_shift: Duration::zero(),
            audience: None,
            preview: false,
        }
    }

    pub fn name(&self) -> &str {
        self.campaign.name()
    }

    pub fn campaign(&self) -> &Campaign {
        &self.campaign
    }

    pub fn time_shift(&self) -> Duration {
        self.time_shift
    }

    /// Walk copies can compute audiences but never send.
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Real current time plus the time shift.
    pub fn now(&self) -> DateTime<Utc> {
        self.ctx.clock.now() + self.time_shift
    }

    /// Recipients matching the rule set at [`Drip::now`], memoized.
    pub fn audience(&mut self) -> Result<&RecipientSet> {
        let audience = match self.audience.take() {
            Some(audience) => audience,
            None => self.compute_audience()?,
        };
        Ok(self.audience.insert(audience))
    }

    fn compute_audience(&self) -> Result<RecipientSet> {
        let base = self.ctx.directory.all()?;
        let audience = RuleSetCompiler::compile(base, self.campaign.rules(), || self.now())?;
        debug!(
            campaign = %self.name(),
            shift_days = self.time_shift.num_days(),
            matched = audience.len(),
            "computed audience"
        );
        Ok(audience)
    }

    /// Drop recipients holding a delivery record for this campaign dated
    /// before the real current time. Returns how many were removed.
    pub fn prune(&mut self) -> Result<usize> {
        let ids = self.audience()?.ids();
        let sent = self
            .ctx
            .store
            .already_sent(self.name(), &ids, self.ctx.clock.now())?;
        if sent.is_empty() {
            return Ok(0);
        }
        if let Some(audience) = self.audience.take() {
            self.audience = Some(audience.without_ids(&sent));
        }
        debug!(campaign = %self.name(), pruned = sent.len(), "pruned audience");
        Ok(sent.len())
    }

    /// `into_past + into_future` read-only copies shifted by whole days,
    /// from `-into_past` up to `into_future - 1`.
    pub fn walk(&self, into_past: u32, into_future: u32) -> Vec<Drip> {
        (-i64::from(into_past)..i64::from(into_future))
            .map(|offset| Drip {
                campaign: Arc::clone(&self.campaign),
                ctx: self.ctx.clone(),
                time_shift: Duration::days(offset),
                audience: None,
                preview: true,
            })
            .collect()
    }

    /// Prune then send. `None` when the campaign is disabled.
    pub fn run(&mut self) -> Result<Option<usize>> {
        if !self.campaign.enabled() {
            debug!(campaign = %self.name(), "campaign disabled, skipping");
            return Ok(None);
        }
        self.prune()?;
        self.send().map(Some)
    }

    /// Deliver to every recipient left in the audience and record each
    /// success. A failed recipient is logged and skipped.
    pub fn send(&mut self) -> Result<usize> {
        if self.preview {
            return Err(EngineError::ReadOnlyPreview(self.name().to_string()));
        }
        let builder = self.builder()?;
        let audience = self.audience()?.clone();
        let name = self.name().to_string();

        let mut sent = 0;
        for recipient in audience.iter() {
            let delivered = builder.render(recipient).and_then(|message| {
                self.ctx.transport.send(&message)?;
                Ok(message)
            });
            match delivered {
                Ok(message) => {
                    self.ctx.store.record(SentDrip::new(
                        name.as_str(),
                        recipient.id,
                        message.subject.as_str(),
                        message.preferred_body(),
                        message.from.as_str(),
                        self.ctx.clock.now(),
                    ))?;
                    sent += 1;
                }
                Err(e) => {
                    warn!(
                        campaign = %name,
                        recipient_id = recipient.id,
                        channel = self.ctx.transport.channel_name(),
                        error = %e,
                        "delivery failed"
                    );
                }
            }
        }

        info!(
            campaign = %name,
            sent,
            failed = audience.len() - sent,
            "campaign sent"
        );
        Ok(sent)
    }

    /// `"Name <addr>"` from the campaign, or the configured default sender.
    pub fn sender(&self) -> String {
        match (&self.campaign.spec.from_email, &self.campaign.spec.from_email_name) {
            (Some(email), Some(name)) => format!("{name} <{email}>"),
            (Some(email), None) => email.clone(),
            (None, _) => self.ctx.config.mail.default_sender(),
        }
    }

    pub fn message_template(&self) -> MessageTemplate {
        MessageTemplate {
            from: self.sender(),
            subject: self.campaign.spec.subject_template.clone(),
            body: self.campaign.spec.body_template.clone(),
        }
    }

    fn builder(&self) -> Result<Box<dyn MessageBuilder>> {
        Ok(self
            .ctx
            .registry
            .builder(&self.campaign.spec.message_class, self.message_template())?)
    }

    /// The message `recipient_id` would receive. Nothing is sent or
    /// recorded.
    pub fn preview_message(&self, recipient_id: RecipientId) -> Result<OutgoingMessage> {
        let recipient = self
            .ctx
            .directory
            .get(recipient_id)?
            .ok_or(EngineError::UnknownRecipient(recipient_id))?;
        Ok(self.builder()?.render(&recipient)?)
    }

    /// HTML alternative of the previewed message if present, otherwise
    /// its plain body.
    pub fn preview_body(&self, recipient_id: RecipientId) -> Result<String> {
        Ok(self.preview_message(recipient_id)?.preferred_body().to_string())
    }
}

impl std::fmt::Debug for Drip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drip")
            .field("campaign", &self.name())
            .field("time_shift", &self.time_shift)
            .field("memoized", &self.audience.is_some())
            .field("preview", &self.preview)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::directory::MemoryDirectory;
    use crate::tracker::MemoryDeliveryStore;
    use chrono::TimeZone;
    use drip_core::Recipient;
    use drip_notify::Outbox;

    fn ctx() -> DripContext {
        let directory = MemoryDirectory::new(vec![
            Recipient::new(1, "a@example.com").with_field("username", "ann"),
            Recipient::new(2, "b@example.com").with_field("username", "bob"),
        ]);
        DripContext::new(
            Config::default(),
            Arc::new(directory),
            Arc::new(MemoryDeliveryStore::new()),
            Arc::new(Outbox::new()),
        )
        .with_clock(Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap(),
        )))
    }

    fn campaign() -> Campaign {
        Campaign::new("welcome", "Hi {{ user.username }}", "<p>Welcome</p>").with_enabled(true)
    }

    #[test]
    fn sender_prefers_campaign_address() {
        let mut ctx = ctx();
        let mut config = Config::default();
        config.mail.from_name = Some("Team".to_string());
        ctx.config = Arc::new(config);

        let drip = Drip::new(campaign(), ctx.clone());
        assert_eq!(drip.sender(), "Team <webmaster@localhost>");

        let named = campaign().with_sender("news@example.com", Some("News".to_string()));
        assert_eq!(Drip::new(named, ctx.clone()).sender(), "News <news@example.com>");

        let bare = campaign().with_sender("news@example.com", None);
        assert_eq!(Drip::new(bare, ctx).sender(), "news@example.com");
    }

    #[test]
    fn walk_offsets_are_whole_days() {
        let drip = Drip::new(campaign(), ctx());
        let shifts: Vec<i64> = drip.walk(2, 3).iter().map(|d| d.time_shift().num_days()).collect();
        assert_eq!(shifts, vec![-2, -1, 0, 1, 2]);
        assert!(drip.walk(2, 3).iter().all(Drip::is_preview));
        assert!(drip.walk(0, 0).is_empty());
    }

    #[test]
    fn now_includes_shift() {
        let drip = Drip::new(campaign(), ctx());
        let copies = drip.walk(1, 0);
        assert_eq!(copies[0].now(), drip.now() - Duration::days(1));
    }

    #[test]
    fn unknown_message_class_fails_at_send() {
        let mut bad = campaign();
        bad.spec.message_class = "weekly".to_string();
        let mut drip = Drip::new(bad, ctx());
        let err = drip.send().unwrap_err();
        assert!(matches!(err, EngineError::Notify(ref e) if e.is_config()));
    }

    #[test]
    fn preview_message_renders_without_recording() {
        let ctx = ctx();
        let store = Arc::clone(&ctx.store);
        let drip = Drip::new(campaign(), ctx);

        let message = drip.preview_message(2).unwrap();
        assert_eq!(message.subject, "Hi bob");
        assert_eq!(drip.preview_body(2).unwrap(), "<p>Welcome</p>");
        assert_eq!(store.count(None).unwrap(), 0);

        let err = drip.preview_message(9).unwrap_err();
        assert!(matches!(err, EngineError::UnknownRecipient(9)));
    }
}
