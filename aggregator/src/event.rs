//! Intake-facing event shape and validation. The wire format is plain
//! JSON; timestamps arrive as ISO 8601 strings and are parsed up front so
//! a malformed timestamp is rejected at Intake rather than surfacing as a
//! store error much later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use store::NewEvent;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventInput {
    pub topic: String,
    pub event_id: String,
    pub timestamp: String,
    pub source: String,
    #[serde(default = "default_payload")]
    pub payload: serde_json::Value,
}

fn default_payload() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventBatch {
    pub events: Vec<EventInput>,
}

/// Fields bounded by this spec are capped at 255 characters, matching the
/// original publisher's schema.
const MAX_FIELD_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum EventValidationError {
    #[error("event batch must not be empty")]
    EmptyBatch,

    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("topic exceeds {MAX_FIELD_LEN} characters")]
    TopicTooLong,

    #[error("event_id must not be empty")]
    EmptyEventId,

    #[error("event_id exceeds {MAX_FIELD_LEN} characters")]
    EventIdTooLong,

    #[error("source must not be empty")]
    EmptySource,

    #[error("source exceeds {MAX_FIELD_LEN} characters")]
    SourceTooLong,

    #[error("invalid timestamp '{0}': not a valid ISO 8601 timestamp")]
    InvalidTimestamp(String),
}

/// Mirrors the tolerant ISO 8601 parsing the original publisher relies on:
/// a trailing `Z` is accepted as shorthand for `+00:00`.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EventValidationError> {
    let normalized = if raw.ends_with('Z') {
        format!("{}+00:00", &raw[..raw.len() - 1])
    } else {
        raw.to_string()
    };
    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| EventValidationError::InvalidTimestamp(raw.to_string()))
}

impl EventInput {
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.topic.is_empty() {
            return Err(EventValidationError::EmptyTopic);
        }
        if self.topic.len() > MAX_FIELD_LEN {
            return Err(EventValidationError::TopicTooLong);
        }
        if self.event_id.is_empty() {
            return Err(EventValidationError::EmptyEventId);
        }
        if self.event_id.len() > MAX_FIELD_LEN {
            return Err(EventValidationError::EventIdTooLong);
        }
        if self.source.is_empty() {
            return Err(EventValidationError::EmptySource);
        }
        if self.source.len() > MAX_FIELD_LEN {
            return Err(EventValidationError::SourceTooLong);
        }
        parse_timestamp(&self.timestamp)?;
        Ok(())
    }

    pub fn into_new_event(self) -> Result<NewEvent, EventValidationError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        Ok(NewEvent {
            topic: self.topic,
            event_id: self.event_id,
            timestamp,
            source: self.source,
            payload: self.payload,
        })
    }
}

impl EventBatch {
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.events.is_empty() {
            return Err(EventValidationError::EmptyBatch);
        }
        for event in &self.events {
            event.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: &str) -> EventInput {
        EventInput {
            topic: "orders".to_string(),
            event_id: "evt-1".to_string(),
            timestamp: timestamp.to_string(),
            source: "checkout".to_string(),
            payload: serde_json::json!({"amount": 42}),
        }
    }

    #[test]
    fn accepts_z_suffixed_timestamp() {
        assert!(sample("2024-01-01T00:00:00Z").validate().is_ok());
    }

    #[test]
    fn accepts_explicit_offset_timestamp() {
        assert!(sample("2024-01-01T00:00:00+00:00").validate().is_ok());
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let err = sample("not-a-timestamp").validate().unwrap_err();
        assert!(matches!(err, EventValidationError::InvalidTimestamp(_)));
    }

    #[test]
    fn rejects_empty_topic() {
        let mut event = sample("2024-01-01T00:00:00Z");
        event.topic = "".to_string();
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::EmptyTopic)
        ));
    }

    #[test]
    fn accepts_whitespace_only_topic() {
        // A raw length check, not trim-aware — matches the original
        // publisher's `Field(..., min_length=1)`.
        let mut event = sample("2024-01-01T00:00:00Z");
        event.topic = " ".to_string();
        assert!(event.validate().is_ok());
    }

    #[test]
    fn rejects_empty_source() {
        let mut event = sample("2024-01-01T00:00:00Z");
        event.source = "".to_string();
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::EmptySource)
        ));
    }

    #[test]
    fn rejects_topic_over_max_length() {
        let mut event = sample("2024-01-01T00:00:00Z");
        event.topic = "t".repeat(MAX_FIELD_LEN + 1);
        assert!(matches!(
            event.validate(),
            Err(EventValidationError::TopicTooLong)
        ));
    }

    #[test]
    fn accepts_topic_at_max_length() {
        let mut event = sample("2024-01-01T00:00:00Z");
        event.topic = "t".repeat(MAX_FIELD_LEN);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        let batch = EventBatch { events: vec![] };
        assert!(matches!(
            batch.validate(),
            Err(EventValidationError::EmptyBatch)
        ));
    }

    #[test]
    fn into_new_event_carries_payload_as_json_value() {
        let event = sample("2024-01-01T00:00:00Z");
        let new_event = event.into_new_event().unwrap();
        assert_eq!(new_event.payload, serde_json::json!({"amount": 42}));
    }
}
