use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::metrics::{install_recorder, metrics_route, track_metrics};
use crate::{intake, read};

pub fn router(ctx: AppContext) -> Router {
    let max_body_bytes = ctx.config.max_body_bytes;
    let export_prometheus = ctx.config.export_prometheus;

    let mut app = Router::new()
        .route("/", get(read::root))
        .route("/health", get(read::health))
        .route("/events", get(read::list_events))
        .route("/stats", get(read::stats))
        .route("/publish", post(intake::publish))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(ctx);

    if export_prometheus {
        let handle = install_recorder();
        app = app.merge(metrics_route(handle));
    }

    app
}
