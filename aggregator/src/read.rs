//! Read-side handlers: the event tail, aggregate stats, service info and
//! the combined health probe. None of these touch the queue — they read
//! the store directly, independent of the ingestion path.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;

use crate::api::{AggregatorError, EventResponse, RootResponse, StatsResponse};
use crate::context::AppContext;
use health::HealthStatus;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub topic: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_events(
    State(ctx): State<AppContext>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventResponse>>, AggregatorError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let events = store::read::list_events(&ctx.pool, query.topic.as_deref(), limit).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

pub async fn stats(State(ctx): State<AppContext>) -> Result<Json<StatsResponse>, AggregatorError> {
    let stats = store::read::get_stats(&ctx.pool).await?;
    let distinct_topics = store::read::distinct_topic_count(&ctx.pool).await?;

    Ok(Json(StatsResponse {
        received: stats.received_count,
        unique_processed: stats.unique_processed,
        duplicate_dropped: stats.duplicate_dropped,
        topics: distinct_topics,
        uptime_seconds: ctx.uptime_seconds(),
        status: "ok",
    }))
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "aggregator",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: &["/publish", "/events", "/stats", "/health", "/metrics"],
    })
}

pub async fn health(State(ctx): State<AppContext>) -> HealthStatus {
    ctx.health.get_status()
}
