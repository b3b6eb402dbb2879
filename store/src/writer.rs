use sqlx::PgPool;

use crate::error::{classify, is_unique_violation, StoreError};
use crate::models::NewEvent;

/// Outcome of writing one event. Distinguishing these at the call site is
/// what lets the worker bump the right Prometheus counter without a second
/// round trip to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    UniqueProcessed,
    DuplicateDropped,
}

/// Writes events to `processed_events`, deduplicating on `(topic,
/// event_id)` and maintaining the `event_stats` singleton. Every write is a
/// single transaction: the received-count bump, the conflict-aware insert,
/// and the matching unique/duplicate bump all commit together or not at
/// all. `ON CONFLICT DO NOTHING` absorbs the ordinary race; if some
/// driver/server combination raises a UNIQUE-violation instead of
/// reporting zero affected rows, that transaction is rolled back and a
/// fresh one records the duplicate, so `duplicate_dropped` stays
/// monotonic regardless of which path the conflict took.
pub struct DeduplicatingWriter {
    pool: PgPool,
}

impl DeduplicatingWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn write(&self, event: &NewEvent) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        sqlx::query(
            "UPDATE event_stats \
             SET received_count = received_count + 1, updated_at = now() \
             WHERE id = 1",
        )
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        let insert_result = sqlx::query(
            "INSERT INTO processed_events (topic, event_id, timestamp, source, payload) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (topic, event_id) DO NOTHING",
        )
        .bind(&event.topic)
        .bind(&event.event_id)
        .bind(event.timestamp)
        .bind(&event.source)
        .bind(&event.payload)
        .execute(&mut *tx)
        .await;

        let insert = match insert_result {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                // The conflict was raised rather than swallowed. This
                // transaction, including its received_count bump above, is
                // dead — roll it back and record the attempt in a fresh one.
                tx.rollback().await.map_err(classify)?;
                return self.record_duplicate().await;
            }
            Err(err) => return Err(classify(err)),
        };

        let outcome = if insert.rows_affected() > 0 {
            sqlx::query(
                "UPDATE event_stats \
                 SET unique_processed = unique_processed + 1, updated_at = now() \
                 WHERE id = 1",
            )
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
            WriteOutcome::UniqueProcessed
        } else {
            sqlx::query(
                "UPDATE event_stats \
                 SET duplicate_dropped = duplicate_dropped + 1, updated_at = now() \
                 WHERE id = 1",
            )
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
            WriteOutcome::DuplicateDropped
        };

        tx.commit().await.map_err(classify)?;

        Ok(outcome)
    }

    /// Fallback path for a UNIQUE-violation raised directly by the driver
    /// instead of being swallowed by `ON CONFLICT DO NOTHING`. The insert
    /// never committed, so there's no row to account for beyond bumping
    /// the two counters the aborted transaction would otherwise have
    /// bumped between them.
    async fn record_duplicate(&self) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        sqlx::query(
            "UPDATE event_stats \
             SET received_count = received_count + 1, \
                 duplicate_dropped = duplicate_dropped + 1, \
                 updated_at = now() \
             WHERE id = 1",
        )
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        Ok(WriteOutcome::DuplicateDropped)
    }
}
