use sqlx::PgPool;

use crate::error::{classify, StoreError};
use crate::models::{ProcessedEvent, Stats};

/// Most recently processed events, newest first, optionally filtered to a
/// single topic.
pub async fn list_events(
    pool: &PgPool,
    topic: Option<&str>,
    limit: i64,
) -> Result<Vec<ProcessedEvent>, StoreError> {
    let rows = match topic {
        Some(topic) => {
            sqlx::query_as::<_, ProcessedEvent>(
                "SELECT id, topic, event_id, timestamp, source, payload, processed_at \
                 FROM processed_events \
                 WHERE topic = $1 \
                 ORDER BY processed_at DESC \
                 LIMIT $2",
            )
            .bind(topic)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, ProcessedEvent>(
                "SELECT id, topic, event_id, timestamp, source, payload, processed_at \
                 FROM processed_events \
                 ORDER BY processed_at DESC \
                 LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    };

    rows.map_err(classify)
}

/// The singleton stats row, plus the distinct-topic count the Read API
/// folds into its response.
pub async fn get_stats(pool: &PgPool) -> Result<Stats, StoreError> {
    sqlx::query_as::<_, Stats>(
        "SELECT received_count, unique_processed, duplicate_dropped, started_at, updated_at \
         FROM event_stats WHERE id = 1",
    )
    .fetch_one(pool)
    .await
    .map_err(classify)
}

pub async fn distinct_topic_count(pool: &PgPool) -> Result<i64, StoreError> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT topic) FROM processed_events")
        .fetch_one(pool)
        .await
        .map_err(classify)
}

/// Cheap reachability check for the health probe.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(classify)?;
    Ok(())
}
