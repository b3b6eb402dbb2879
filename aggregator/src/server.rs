//! Startup and shutdown: builds the `AppContext` once, spawns the worker
//! pool and the probes that keep the health registry fresh, then serves
//! HTTP until asked to stop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use tokio::sync::watch;
use tracing::info;

use health::HealthRegistry;
use queue::EventQueue;
use store::DeduplicatingWriter;

use crate::config::Config;
use crate::context::AppContext;
use crate::router::router;
use crate::worker;

const COMPONENT_DEADLINE: time::Duration = time::Duration::seconds(30);
const PROBE_INTERVAL: Duration = Duration::from_secs(5);

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let health = HealthRegistry::new("aggregator");

    let pool = store::connect_with_retry(
        &config.database_url,
        config.max_db_connections,
        config.startup_max_retries,
        Duration::from_millis(config.startup_initial_backoff_ms),
    )
    .await
    .context("failed to connect to the store after bounded retries")?;

    let queue = EventQueue::connect(&config.redis_url)
        .await
        .context("failed to connect to the queue")?;

    let ctx = AppContext {
        config: config.clone(),
        pool: pool.clone(),
        writer: Arc::new(DeduplicatingWriter::new(pool.clone())),
        queue: queue.clone(),
        health: health.clone(),
        started_at: Instant::now(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    spawn_store_probe(pool.clone(), health.clone()).await;
    spawn_queue_probe(queue.clone(), health.clone()).await;
    let worker_handles = spawn_workers(&ctx, health.clone(), shutdown_rx.clone()).await;

    let app = router(ctx);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    info!(addr = %config.bind_addr(), workers = config.worker_count, "aggregator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("shutdown signal received, stopping workers");
    let _ = shutdown_tx.send(true);
    for handle in worker_handles {
        let _ = handle.await;
    }

    Ok(())
}

async fn spawn_workers(
    ctx: &AppContext,
    health: HealthRegistry,
    shutdown_rx: watch::Receiver<bool>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut handles = Vec::with_capacity(ctx.config.worker_count as usize);
    for id in 0..ctx.config.worker_count {
        let name = format!("worker-{id}");
        let worker_health = health.register(name.clone(), COMPONENT_DEADLINE).await;
        let worker_ctx = ctx.clone();
        let rx = shutdown_rx.clone();
        handles.push(tokio::spawn(worker::run(
            name,
            worker_ctx,
            worker_health,
            rx,
        )));
    }
    handles
}

async fn spawn_store_probe(pool: sqlx::PgPool, health: HealthRegistry) {
    let handle = health.register("store".to_string(), COMPONENT_DEADLINE).await;
    tokio::spawn(async move {
        loop {
            match store::read::ping(&pool).await {
                Ok(()) => handle.report_healthy().await,
                Err(err) => {
                    tracing::warn!(error = %err, "store probe failed");
                    handle
                        .report_status(health::ComponentStatus::Unhealthy)
                        .await;
                }
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    });
}

async fn spawn_queue_probe(queue: EventQueue, health: HealthRegistry) {
    let handle = health.register("queue".to_string(), COMPONENT_DEADLINE).await;
    tokio::spawn(async move {
        loop {
            match queue.ping().await {
                Ok(()) => handle.report_healthy().await,
                Err(err) => {
                    tracing::warn!(error = %err, "queue probe failed");
                    handle
                        .report_status(health::ComponentStatus::Unhealthy)
                        .await;
                }
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    });
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
