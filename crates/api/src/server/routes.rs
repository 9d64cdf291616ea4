//! Route definitions

use agentmetrics_domain::constants::EXTERNAL_METRICS_GROUP_VERSION;
use axum::routing::get;
use axum::Router;

use super::{handlers, ServerState};

/// Liveness probe for the adapter process
pub fn health_routes() -> Router<ServerState> {
    Router::new().route("/healthz", get(handlers::healthz))
}

/// The `external.metrics.k8s.io/v1beta1` API group
pub fn external_metrics_routes() -> Router<ServerState> {
    let base = format!("/apis/{EXTERNAL_METRICS_GROUP_VERSION}");

    Router::new()
        .route(&base, get(handlers::list_external_metrics))
        .route(
            &format!("{base}/namespaces/{{namespace}}/{{metric}}"),
            get(handlers::get_external_metric),
        )
}

/// Full router with state attached.
pub fn router(state: ServerState) -> Router {
    Router::new().merge(health_routes()).merge(external_metrics_routes()).with_state(state)
}
