use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Action, Thought};

/// One entry in a session's chronological timeline, combining thoughts and
/// actions into a single list for visualization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// THOUGHT or ACTION
    #[serde(rename = "type")]
    pub entry_type: String,
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub status: Option<String>,
    pub metadata: Option<String>,
}

impl From<Thought> for TimelineEntry {
    fn from(thought: Thought) -> Self {
        Self {
            entry_type: "THOUGHT".to_string(),
            id: thought.id,
            timestamp: thought.timestamp,
            content: thought.thought_content,
            status: Some(thought.thought_type),
            metadata: thought.metadata,
        }
    }
}

impl From<Action> for TimelineEntry {
    fn from(action: Action) -> Self {
        Self {
            entry_type: "ACTION".to_string(),
            id: action.id,
            timestamp: action.start_time,
            content: action.action_name,
            status: Some(action.status.as_str().to_string()),
            metadata: action.input_data,
        }
    }
}
