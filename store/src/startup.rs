use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, warn};

use crate::error::{classify, StoreError};

/// Connects to Postgres with a bounded exponential backoff, then runs the
/// crate's migrations. The store is a hard startup dependency: if it's
/// still unreachable after `max_retries` attempts, this returns an error
/// and the caller is expected to exit non-zero rather than serve traffic
/// against a database it never reached.
pub async fn connect_with_retry(
    database_url: &str,
    max_connections: u32,
    max_retries: u32,
    initial_backoff: Duration,
) -> Result<PgPool, StoreError> {
    let mut attempt = 0u32;
    let mut backoff = initial_backoff;

    loop {
        attempt += 1;
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(StoreError::Migration)?;
                return Ok(pool);
            }
            Err(err) if attempt < max_retries => {
                warn!(
                    attempt,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "store connection attempt failed, retrying: {}",
                    err
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(err) => {
                error!(
                    attempt,
                    max_retries, "store connection failed after all retries: {}", err
                );
                return Err(classify(err));
            }
        }
    }
}
