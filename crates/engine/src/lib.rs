//! Drip campaign runtime.
//!
//! Ties the rule engine, the recipient directory, the delivery tracker and
//! the mail transports together: compute a campaign's audience at a
//! (possibly shifted) instant, prune already-notified recipients, send,
//! record, and preview audiences day by day.

pub mod clock;
pub mod directory;
pub mod drip;
pub mod error;
pub mod runner;
pub mod timeline;
pub mod tracker;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::{MemoryDirectory, RecipientDirectory};
pub use drip::{Drip, DripContext};
pub use error::{EngineError, Result};
pub use runner::{run_enabled, CampaignReport, RunOutcome};
pub use timeline::{timeline, TimelineDay};
pub use tracker::{DeliveryStore, JsonlDeliveryStore, MemoryDeliveryStore, SentDrip};
pub use validate::{validate_all, validate_campaign};
