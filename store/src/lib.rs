//! Postgres-backed persistence: the `processed_events` / `event_stats`
//! schema, the deduplicating Writer, and the read-side queries behind the
//! Read API.

pub mod error;
pub mod models;
pub mod read;
pub mod startup;
pub mod writer;

pub use error::StoreError;
pub use models::{NewEvent, ProcessedEvent, Stats};
pub use startup::connect_with_retry;
pub use writer::{DeduplicatingWriter, WriteOutcome};
