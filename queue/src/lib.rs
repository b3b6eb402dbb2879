//! Thin wrapper around a single multiplexed Redis connection, used as the
//! at-least-once delivery boundary between the Intake endpoint and the
//! Worker pool. The queue itself is a plain Redis list: `RPUSH` to enqueue,
//! `BLPOP` with a bounded timeout to dequeue. No visibility timeouts, no
//! acknowledgements — delivery is at-least-once, and the Writer on the far
//! side is idempotent, so redelivery is harmless.

use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use serde_json::Value;
use thiserror::Error;

const QUEUE_KEY: &str = "event_queue";

#[derive(Debug, Error)]
pub enum QueueError {
    /// The connection to Redis itself is the problem: TCP reset, refused,
    /// timed out establishing. The health probe and caller should treat
    /// this as "queue unreachable", distinct from a malformed command.
    #[error("queue connection error: {0}")]
    Connection(#[source] RedisError),

    /// Redis accepted the connection but rejected or failed the command.
    #[error("queue command error: {0}")]
    Command(#[source] RedisError),

    #[error("failed to encode event as JSON: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode event from JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

fn classify(err: RedisError) -> QueueError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        QueueError::Connection(err)
    } else {
        QueueError::Command(err)
    }
}

/// A handle to the queue. Cheap to clone: the underlying
/// `MultiplexedConnection` is shared, so every clone talks over the same
/// TCP connection rather than opening a new one per task.
#[derive(Clone)]
pub struct EventQueue {
    conn: MultiplexedConnection,
}

impl EventQueue {
    /// Connects once and returns a queue handle. Callers that need bounded
    /// startup retry (the aggregator's lifecycle does) should wrap this in
    /// their own backoff loop; this call itself does not retry.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let client = Client::open(redis_url).map_err(QueueError::Connection)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(QueueError::Connection)?;
        Ok(Self { conn })
    }

    /// Pushes a batch of event payloads onto the queue in a single
    /// pipelined round trip. Either the whole batch is queued or none of
    /// it is: a partial pipeline failure surfaces as a command error and
    /// the Intake endpoint reports 503 rather than a partial 202.
    pub async fn push_batch(&self, events: &[Value]) -> Result<(), QueueError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for event in events {
            let encoded = serde_json::to_string(event).map_err(QueueError::Encode)?;
            pipe.rpush(QUEUE_KEY, encoded).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async(&mut conn).await.map_err(classify)
    }

    /// Blocking pop with a bounded timeout. Returns `None` on an empty
    /// queue within the timeout (the normal "nothing to do" case, not an
    /// error) so a worker's poll loop can check its cancellation flag on
    /// every iteration without starving on an indefinite block.
    pub async fn pop(&self, timeout: Duration) -> Result<Option<Value>, QueueError> {
        let mut conn = self.conn.clone();
        let timeout_secs = timeout.as_secs_f64().max(0.001);

        let reply: Option<(String, String)> = conn
            .blpop(QUEUE_KEY, timeout_secs)
            .await
            .map_err(classify)?;

        match reply {
            None => Ok(None),
            Some((_key, raw)) => {
                let value = serde_json::from_str(&raw).map_err(QueueError::Decode)?;
                Ok(Some(value))
            }
        }
    }

    /// Cheap reachability check for the health probe: `PING` over the
    /// shared connection.
    pub async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(classify)
    }

    /// Current queue depth, for the metrics surface.
    pub async fn depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.conn.clone();
        conn.llen(QUEUE_KEY).await.map_err(classify)
    }
}
