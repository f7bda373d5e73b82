//! Message rendering and delivery for drip campaigns.
//!
//! This crate provides:
//! - `MailTransport` trait for pluggable delivery (SMTP, in-memory outbox, log)
//! - Minijinja template rendering with the recipient bound as `user`
//! - Multipart and plain-text message builders
//! - A message-class registry populated from configuration

pub mod email;
pub mod message;
pub mod outbox;
pub mod registry;
pub mod templating;
pub mod traits;

pub use email::SmtpMailer;
pub use message::{strip_tags, MessageBuilder, MessageTemplate};
pub use outbox::{LogTransport, Outbox};
pub use registry::{MessageKind, MessageRegistry};
pub use templating::{TemplateContext, TemplateRenderer};
pub use traits::{MailTransport, NotifyError, OutgoingMessage};
