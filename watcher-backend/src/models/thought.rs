use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded reasoning step. Immutable after insert; the timestamp is
/// assigned at write time, not taken from the caller.
///
/// `thought_type` is conventionally one of PLANNING, REASONING,
/// TOOL_SELECTION, EXECUTION, REFLECTION or ERROR but any caller string is
/// accepted and stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: i64,
    pub agent_id: String,
    pub session_id: String,
    pub thought_type: String,
    pub thought_content: String,
    /// Nominally 0.0-1.0, not validated
    pub confidence_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
    /// Reserved for threading chains of reasoning; never populated today
    pub parent_thought_id: Option<i64>,
    pub metadata: Option<String>,
}

/// Request type for the narrow thought-logging endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogThoughtRequest {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub thought_type: String,
    #[serde(default)]
    pub content: String,
    pub confidence: Option<f64>,
}
