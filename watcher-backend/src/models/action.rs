use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    #[default]
    Started,
    InProgress,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Started => "STARTED",
            ActionStatus::InProgress => "IN_PROGRESS",
            ActionStatus::Completed => "COMPLETED",
            ActionStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "STARTED" => Some(ActionStatus::Started),
            "IN_PROGRESS" => Some(ActionStatus::InProgress),
            "COMPLETED" => Some(ActionStatus::Completed),
            "FAILED" => Some(ActionStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded operation the agent performed. Created IN_PROGRESS and
/// transitions to COMPLETED (with output) or FAILED (with an error message)
/// at most once; `duration_ms` is the wall-clock delta between start and end
/// when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: i64,
    pub agent_id: String,
    pub session_id: String,
    /// API_CALL, TOOL_USE, COMPUTATION, DATA_RETRIEVAL or any caller string
    pub action_type: String,
    pub action_name: String,
    pub input_data: Option<String>,
    pub output_data: Option<String>,
    pub status: ActionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    /// Reserved; never populated today
    pub related_thought_id: Option<i64>,
}

/// Request type for the narrow action-logging endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActionRequest {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub action_name: String,
    pub input_data: Option<String>,
}
