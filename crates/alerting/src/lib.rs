//! Honeywatch alerting crate.
//!
//! # Modules
//!
//! - [`store`]: deterministic event identity, the store adapter and two event stores
//! - [`channel`]: Slack, SendGrid and log notification channels
//! - [`render`]: notification subjects and bodies
//! - [`dispatcher`]: immediate and summary notifications over all channels
//! - [`pass`]: one complete analysis pass
//!
//! # Architecture
//!
//! ```text
//! LogSource -> DetectorEngine -> StoreAdapter -> AlertDispatcher -> channels
//!                                     |                |
//!                               Memory / JSONL   Slack / SendGrid / log
//! ```

pub mod channel;
pub mod dispatcher;
pub mod pass;
pub mod render;
pub mod store;

// --- re-exports ---

pub use channel::{LogChannel, SendGridEmailChannel, SlackWebhookChannel, build_channels};
pub use dispatcher::{
    AlertDispatcher, DeliveryOutcome, DeliveryRecord, DispatchReport, NotificationKind,
    UpsertedEvent,
};
pub use pass::{AnalysisPass, PassReport};
pub use store::{
    JsonFileEventStore, MemoryEventStore, StoreAdapter, UpsertOutcome, event_identity, query,
};
