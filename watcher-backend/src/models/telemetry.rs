use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One numeric observation about agent performance. Append-only; no
/// aggregation happens in this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub id: i64,
    pub agent_id: String,
    pub session_id: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub metric_unit: String,
    /// LATENCY, TOKENS, COST, ERROR_RATE, CUSTOM or any caller string
    pub metric_type: String,
    pub timestamp: DateTime<Utc>,
    pub tags: Option<String>,
}

fn default_metric_type() -> String {
    "CUSTOM".to_string()
}

/// Request type for the narrow metric-logging endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetricRequest {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub metric_value: f64,
    #[serde(default)]
    pub metric_unit: String,
    #[serde(default = "default_metric_type")]
    pub metric_type: String,
}
