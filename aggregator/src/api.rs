//! Response bodies and the error-to-status-code mapping shared by the
//! Intake and Read API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::event::EventValidationError;
use store::ProcessedEvent;

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    pub queued: usize,
    pub message: String,
}

/// The canonical wire shape for a persisted event, as returned by `GET
/// /events`. Deliberately does not carry the internal `id` primary key —
/// that column is persistence-layer detail, not part of the event's
/// business identity.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub topic: String,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub payload: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

impl From<ProcessedEvent> for EventResponse {
    fn from(event: ProcessedEvent) -> Self {
        Self {
            topic: event.topic,
            event_id: event.event_id,
            timestamp: event.timestamp,
            source: event.source,
            payload: event.payload,
            processed_at: event.processed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub received: i64,
    pub unique_processed: i64,
    pub duplicate_dropped: i64,
    pub topics: i64,
    pub uptime_seconds: i64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: &'static [&'static str],
}

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("invalid event: {0}")]
    Validation(#[from] EventValidationError),

    #[error("queue unavailable: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("store unavailable: {0}")]
    Store(#[from] store::StoreError),

    #[error("failed to decode queued event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl IntoResponse for AggregatorError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregatorError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AggregatorError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AggregatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AggregatorError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}
