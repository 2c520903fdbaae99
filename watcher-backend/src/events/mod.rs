//! Agent event envelope and its dispatch onto the watcher service.

mod parser;

pub use parser::EventParser;

use serde::Deserialize;
use serde_json::Value;

fn default_general() -> String {
    "GENERAL".to_string()
}

/// One externally-shaped agent event, discriminated by its `type` field.
/// Deserialized at the boundary so malformed variants are rejected before
/// any persistence happens. Unknown `type` values fail deserialization and
/// are dropped with a warning by the parser.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Thought {
        #[serde(default = "default_general")]
        thought_type: String,
        #[serde(default)]
        content: String,
        confidence: Option<f64>,
        processing_time_ms: Option<f64>,
    },
    Action {
        #[serde(default)]
        action_name: String,
        #[serde(default = "default_general")]
        action_type: String,
        status: Option<String>,
        input: Option<Value>,
        action_id: Option<i64>,
        output: Option<Value>,
    },
    ToolCall {
        #[serde(default)]
        tool_name: String,
        status: Option<String>,
        reasoning: Option<String>,
        arguments: Option<Value>,
    },
    Completion {
        response: Option<String>,
        total_tokens: Option<f64>,
        total_cost: Option<f64>,
    },
    Error {
        #[serde(default)]
        error: String,
        action_id: Option<i64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_thought_event_defaults() {
        let event: AgentEvent =
            serde_json::from_value(json!({"type": "thought", "content": "hmm"})).unwrap();
        match event {
            AgentEvent::Thought {
                thought_type,
                content,
                confidence,
                processing_time_ms,
            } => {
                assert_eq!(thought_type, "GENERAL");
                assert_eq!(content, "hmm");
                assert!(confidence.is_none());
                assert!(processing_time_ms.is_none());
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_tool_call_variant_name() {
        let event: AgentEvent =
            serde_json::from_value(json!({"type": "tool_call", "tool_name": "search"})).unwrap();
        assert!(matches!(event, AgentEvent::ToolCall { .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<AgentEvent, _> =
            serde_json::from_value(serde_json::json!({"type": "telepathy"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_fields_are_ignored() {
        // The HTTP envelope carries agentId/sessionId next to the event fields
        let event: AgentEvent = serde_json::from_value(json!({
            "type": "completion",
            "agentId": "agent-1",
            "sessionId": "sess-1",
            "response": "done",
            "total_tokens": 42
        }))
        .unwrap();
        match event {
            AgentEvent::Completion { response, total_tokens, .. } => {
                assert_eq!(response.as_deref(), Some("done"));
                assert_eq!(total_tokens, Some(42.0));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
