//! Request handlers

use agentmetrics_core::{LabelMatcher, Selector};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use super::error::ApiError;
use super::responses::{ApiResourceList, ExternalMetricValueList};
use super::ServerState;

/// Liveness probe: GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

/// Every metric published at least once: GET /apis/external.metrics.k8s.io/v1beta1
pub async fn list_external_metrics(State(state): State<ServerState>) -> Json<ApiResourceList> {
    Json(ApiResourceList::for_metrics(state.store().metric_names()))
}

/// Query string of a metric read.
#[derive(Debug, Default, Deserialize)]
pub struct MetricQuery {
    #[serde(rename = "labelSelector")]
    pub label_selector: Option<String>,
}

/// Values of one metric filtered by label selector:
/// GET /apis/external.metrics.k8s.io/v1beta1/namespaces/{namespace}/{metric}
///
/// Unknown metrics yield an empty list. The namespace is accepted but does
/// not scope the read; every agent type lives in the adapter's namespace.
pub async fn get_external_metric(
    State(state): State<ServerState>,
    Path((namespace, metric)): Path<(String, String)>,
    Query(query): Query<MetricQuery>,
) -> Result<Json<ExternalMetricValueList>, ApiError> {
    let selector = match query.label_selector.as_deref() {
        Some(raw) => Selector::parse(raw)?,
        None => Selector::everything(),
    };

    let items = state.store().read(&metric, &selector);
    debug!(
        %namespace,
        metric = %metric,
        selector = %selector,
        filtered = !selector.is_empty(),
        count = items.len(),
        "Served external metric"
    );

    Ok(Json(ExternalMetricValueList::new(items)))
}
