//! Adapter constants
//!
//! Centralized location for the fixed values shared by the collection
//! pipeline and the serving surface.

// Metric names served to consumers
pub const METRIC_AGENTS_TOTAL: &str = "agents_total";
pub const METRIC_AGENTS_IDLE: &str = "agents_idle";
pub const METRIC_AGENTS_OCCUPIED: &str = "agents_occupied";
pub const METRIC_AGENTS_OCCUPIED_PERCENTAGE: &str = "agents_occupied_percentage";
pub const METRIC_JOBS_TOTAL: &str = "jobs_total";
pub const METRIC_JOBS_QUEUED: &str = "jobs_queued";
pub const METRIC_JOBS_RUNNING: &str = "jobs_running";

/// Label attached to every exported value, carrying the record name.
pub const LABEL_AGENT_TYPE: &str = "agent_type";

// Credential discovery
pub const AUTOSCALED_LABEL_SELECTOR: &str = "semaphore-agent/autoscaled=true";
pub const SECRET_FIELD_ENDPOINT: &str = "endpoint";
pub const SECRET_FIELD_TOKEN: &str = "token";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_AGENT_TYPE_NAME: &str = "default";

// Upstream metrics API
pub const UPSTREAM_METRICS_PATH: &str = "/api/v1/self_hosted_agents/metrics";

// Timing and sizing
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_CAPACITY: u64 = 50;

// Serving surface
pub const EXTERNAL_METRICS_GROUP_VERSION: &str = "external.metrics.k8s.io/v1beta1";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:6443";

// In-cluster Kubernetes access
pub const DEFAULT_KUBERNETES_API_URL: &str = "https://kubernetes.default.svc";
pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const DEFAULT_SERVICE_ACCOUNT_CA_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
