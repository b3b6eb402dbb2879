//! Explicit application state, built once in `main` and threaded through
//! the router's `State` and into each worker task. There is no process-wide
//! mutable global here; everything a handler or worker needs travels
//! through this struct.

use std::sync::Arc;
use std::time::Instant;

use health::HealthRegistry;
use queue::EventQueue;
use sqlx::PgPool;
use store::DeduplicatingWriter;

use crate::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub writer: Arc<DeduplicatingWriter>,
    pub queue: EventQueue,
    pub health: HealthRegistry,
    pub started_at: Instant,
}

impl AppContext {
    pub fn uptime_seconds(&self) -> i64 {
        self.started_at.elapsed().as_secs() as i64
    }
}
