//! The Intake endpoint: validates an incoming event batch and enqueues it.
//! Intake never writes to the store directly — it only has to get the
//! batch onto the queue, so a slow or unavailable store never blocks a
//! publisher's request.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use crate::api::{AggregatorError, PublishResponse};
use crate::context::AppContext;
use crate::event::EventBatch;

#[tracing::instrument(skip_all, fields(batch_size = batch.events.len()))]
pub async fn publish(
    State(ctx): State<AppContext>,
    Json(batch): Json<EventBatch>,
) -> Result<(StatusCode, Json<PublishResponse>), AggregatorError> {
    if let Err(err) = batch.validate() {
        metrics::counter!("aggregator_events_rejected_total").increment(batch.events.len() as u64);
        tracing::warn!(error = %err, "rejected event batch");
        return Err(err.into());
    }

    let payloads: Vec<serde_json::Value> = batch
        .events
        .iter()
        .map(|event| serde_json::to_value(event).expect("EventInput is always serializable"))
        .collect();

    ctx.queue.push_batch(&payloads).await?;

    let queued = payloads.len();
    metrics::counter!("aggregator_events_received_total").increment(queued as u64);
    tracing::debug!(queued, "enqueued event batch");

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishResponse {
            status: "accepted",
            queued,
            message: format!("queued {queued} event(s)"),
        }),
    ))
}
