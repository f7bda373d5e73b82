//! Message builders: render a campaign's templates for one recipient.
//!
//! The multipart builder strips markup from the rendered body for the
//! plain-text part and attaches the original as HTML only when stripping
//! changed it. The plain-text builder never attaches HTML.

use std::sync::LazyLock;

use drip_core::Recipient;
use regex::Regex;

use crate::templating::{TemplateContext, TemplateRenderer};
use crate::traits::{NotifyError, OutgoingMessage};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*?>").expect("tag regex"));

/// Remove markup tags, keeping their text content.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Sender plus subject/body templates of one campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Builds the message one recipient receives.
pub trait MessageBuilder: Send + Sync {
    fn render(&self, recipient: &Recipient) -> Result<OutgoingMessage, NotifyError>;

    /// Registry kind name of this builder.
    fn kind(&self) -> &'static str;
}

struct Rendered {
    subject: String,
    body: String,
}

fn render_parts(
    renderer: &TemplateRenderer,
    template: &MessageTemplate,
    recipient: &Recipient,
) -> Result<Rendered, NotifyError> {
    let ctx = TemplateContext::for_recipient(recipient);
    let subject = renderer.render(&template.subject, &ctx)?;
    // header values cannot span lines
    let subject = subject.split_whitespace().collect::<Vec<_>>().join(" ");
    let body = renderer.render_body(&template.body, &ctx)?;
    Ok(Rendered { subject, body })
}

/// Plain text plus an optional HTML alternative.
pub struct MultipartMessage {
    template: MessageTemplate,
    renderer: TemplateRenderer,
}

impl MultipartMessage {
    pub const KIND: &'static str = "multipart";

    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            renderer: TemplateRenderer::new(),
        }
    }
}

impl MessageBuilder for MultipartMessage {
    fn render(&self, recipient: &Recipient) -> Result<OutgoingMessage, NotifyError> {
        let Rendered { subject, body } = render_parts(&self.renderer, &self.template, recipient)?;
        let text = strip_tags(&body);
        let html = (text.len() != body.len()).then_some(body);
        Ok(OutgoingMessage {
            from: self.template.from.clone(),
            to: recipient.email.clone(),
            subject,
            text,
            html,
        })
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }
}

/// Plain text only; markup is stripped from the body.
pub struct PlainTextMessage {
    template: MessageTemplate,
    renderer: TemplateRenderer,
}

impl PlainTextMessage {
    pub const KIND: &'static str = "plain_text";

    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            renderer: TemplateRenderer::new(),
        }
    }
}

impl MessageBuilder for PlainTextMessage {
    fn render(&self, recipient: &Recipient) -> Result<OutgoingMessage, NotifyError> {
        let Rendered { subject, body } = render_parts(&self.renderer, &self.template, recipient)?;
        Ok(OutgoingMessage {
            from: self.template.from.clone(),
            to: recipient.email.clone(),
            subject,
            text: strip_tags(&body),
            html: None,
        })
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }
}
