//! Wire shapes of the external metrics API

use agentmetrics_domain::constants::EXTERNAL_METRICS_GROUP_VERSION;
use agentmetrics_domain::ExportedValue;
use serde::{Deserialize, Serialize};

const EXTERNAL_METRIC_VALUE_LIST_KIND: &str = "ExternalMetricValueList";

/// `APIResourceList` naming every published metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    pub kind: String,
    pub api_version: String,
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

/// One metric entry in discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: Vec<String>,
}

impl ApiResourceList {
    /// Discovery document listing `names` as namespaced, read-only
    /// resources.
    pub fn for_metrics<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            kind: "APIResourceList".into(),
            api_version: "v1".into(),
            group_version: EXTERNAL_METRICS_GROUP_VERSION.into(),
            resources: names
                .into_iter()
                .map(|name| ApiResource {
                    name,
                    singular_name: String::new(),
                    namespaced: true,
                    kind: EXTERNAL_METRIC_VALUE_LIST_KIND.into(),
                    verbs: vec!["get".into()],
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMeta {}

/// `ExternalMetricValueList` returned for one metric read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMetricValueList {
    pub kind: String,
    pub api_version: String,
    pub metadata: ListMeta,
    pub items: Vec<ExportedValue>,
}

impl ExternalMetricValueList {
    pub fn new(items: Vec<ExportedValue>) -> Self {
        Self {
            kind: EXTERNAL_METRIC_VALUE_LIST_KIND.into(),
            api_version: EXTERNAL_METRICS_GROUP_VERSION.into(),
            metadata: ListMeta::default(),
            items,
        }
    }
}

/// Kubernetes `Status` body used for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub kind: String,
    pub api_version: String,
    pub status: String,
    pub message: String,
    pub reason: String,
    pub code: u16,
}

impl Status {
    /// Failure status with the given HTTP code and reason.
    pub fn failure(code: u16, reason: &str, message: impl Into<String>) -> Self {
        Self {
            kind: "Status".into(),
            api_version: "v1".into(),
            status: "Failure".into(),
            message: message.into(),
            reason: reason.into(),
            code,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn value_list_serializes_in_external_metrics_shape() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let metrics = agentmetrics_domain::RawMetrics::new(5, 5, 0, 5);
        let value = ExportedValue::for_agent_type(
            agentmetrics_domain::MetricKind::AgentsOccupiedPercentage,
            "s1",
            &metrics,
            timestamp,
        );

        let body = serde_json::to_value(ExternalMetricValueList::new(vec![value])).unwrap();
        assert_eq!(
            body,
            json!({
                "kind": "ExternalMetricValueList",
                "apiVersion": "external.metrics.k8s.io/v1beta1",
                "metadata": {},
                "items": [{
                    "metricName": "agents_occupied_percentage",
                    "metricLabels": {"agent_type": "s1"},
                    "timestamp": "2024-01-02T03:04:05Z",
                    "value": "50"
                }]
            })
        );
    }

    #[test]
    fn resource_list_names_each_metric() {
        let list = ApiResourceList::for_metrics(vec!["agents_idle".to_string()]);
        let body = serde_json::to_value(list).unwrap();

        assert_eq!(body["groupVersion"], "external.metrics.k8s.io/v1beta1");
        assert_eq!(body["resources"][0]["name"], "agents_idle");
        assert_eq!(body["resources"][0]["kind"], "ExternalMetricValueList");
        assert_eq!(body["resources"][0]["verbs"], json!(["get"]));
    }
}
