//! Interview statistics.
//!
//! Interview starts and outcomes from the event stream are stored in `SQLite`.
//! Aggregates are computed when read.

mod aggregator;
mod error;
mod schema;
mod store;
mod types;
mod writer;

pub use aggregator::{days_before, Aggregator, MaintenanceReport};
pub use error::AnalyticsError;
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use store::AnalyticsStore;
pub use types::{
    InterviewRecord, OutcomeCounts, OutcomePercentages, PruneReport, QueueSnapshot, Stats,
    BUSIEST_HOURS,
};
pub use writer::{spawn_writer, AnalyticsHandle};
