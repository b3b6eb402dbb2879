//! The Worker pool: each worker runs an independent poll loop against the
//! queue, decodes and validates whatever it pops, and hands it to the
//! Writer. Cancellation is a cooperative flag checked once per pop, so a
//! worker stops within one pop timeout of shutdown being requested rather
//! than being killed mid-write.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;

use crate::api::AggregatorError;
use crate::context::AppContext;
use crate::event::EventInput;
use health::HealthHandle;
use store::WriteOutcome;

pub async fn run(
    worker_name: String,
    ctx: AppContext,
    health: HealthHandle,
    mut shutdown: watch::Receiver<bool>,
) {
    let pop_timeout = Duration::from_millis(ctx.config.queue_pop_timeout_ms);
    let error_backoff = Duration::from_millis(ctx.config.worker_error_backoff_ms);

    tracing::info!(worker = %worker_name, "worker starting");

    loop {
        if *shutdown.borrow() {
            break;
        }

        health.report_healthy().await;

        match ctx.queue.pop(pop_timeout).await {
            Ok(None) => continue,
            Ok(Some(raw)) => match process_one(&ctx, raw).await {
                Ok(()) => {}
                // Poison message: the payload came out of our own queue malformed
                // or failing validation the Intake endpoint already enforced. It
                // cannot succeed on retry, so it's logged and dropped without the
                // Writer-failure backoff.
                Err(ProcessError::Poison(err)) => {
                    tracing::error!(worker = %worker_name, error = %err, "dropping poison message");
                }
                Err(ProcessError::Writer(err)) => {
                    tracing::error!(worker = %worker_name, error = %err, "writer failed, backing off");
                    tokio::time::sleep(error_backoff).await;
                }
            },
            Err(err) => {
                tracing::error!(worker = %worker_name, error = %err, "queue pop failed");
                tokio::time::sleep(error_backoff).await;
            }
        }
    }

    tracing::info!(worker = %worker_name, "worker stopped");
}

enum ProcessError {
    Poison(AggregatorError),
    Writer(AggregatorError),
}

async fn process_one(ctx: &AppContext, raw: Value) -> Result<(), ProcessError> {
    let input: EventInput =
        serde_json::from_value(raw).map_err(|err| ProcessError::Poison(err.into()))?;
    input
        .validate()
        .map_err(|err| ProcessError::Poison(err.into()))?;
    let new_event = input
        .into_new_event()
        .map_err(|err| ProcessError::Poison(err.into()))?;

    let outcome = ctx
        .writer
        .write(&new_event)
        .await
        .map_err(|err| ProcessError::Writer(err.into()))?;

    match outcome {
        WriteOutcome::UniqueProcessed => {
            metrics::counter!("aggregator_events_unique_total").increment(1);
        }
        WriteOutcome::DuplicateDropped => {
            metrics::counter!("aggregator_events_duplicate_total").increment(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_queued_event_back_into_input() {
        let raw = serde_json::json!({
            "topic": "orders",
            "event_id": "evt-1",
            "timestamp": "2024-01-01T00:00:00Z",
            "source": "checkout",
            "payload": {"amount": 42},
        });
        let input: EventInput = serde_json::from_value(raw).unwrap();
        assert_eq!(input.topic, "orders");
        assert!(input.validate().is_ok());
    }
}
