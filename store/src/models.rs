use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event accepted by Intake, on its way through the queue to the
/// Writer. Carries no id yet — identity is `(topic, event_id)`, assigned
/// by the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub topic: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub payload: serde_json::Value,
}

/// A row in `processed_events`, as read back by the Read API.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessedEvent {
    pub id: i64,
    pub topic: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub payload: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

/// The singleton `event_stats` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Stats {
    pub received_count: i64,
    pub unique_processed: i64,
    pub duplicate_dropped: i64,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
