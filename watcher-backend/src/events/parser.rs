//! Stateless dispatch of agent events onto the watcher service.
//!
//! Events arrive as loose JSON (from the telemetry endpoint or the outbound
//! stream) and are normalized into watcher calls. Processing is best-effort:
//! a malformed or failing event is logged and dropped, never surfaced to the
//! submitter.

use rusqlite::Result as SqliteResult;
use serde_json::Value;
use std::sync::Arc;

use super::AgentEvent;
use crate::watcher::WatcherService;

pub struct EventParser {
    watcher: Arc<WatcherService>,
}

impl EventParser {
    pub fn new(watcher: Arc<WatcherService>) -> Self {
        Self { watcher }
    }

    /// Parse and process one agent event. Errors never propagate to the
    /// caller; the event is dropped instead.
    pub fn process_event(&self, agent_id: &str, session_id: &str, event: Value) {
        let event: AgentEvent = match serde_json::from_value(event) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Dropping unrecognized agent event: {}", e);
                return;
            }
        };

        let result = match event {
            AgentEvent::Thought {
                thought_type,
                content,
                confidence,
                processing_time_ms,
            } => self.process_thought(
                agent_id,
                session_id,
                &thought_type,
                &content,
                confidence,
                processing_time_ms,
            ),
            AgentEvent::Action {
                action_name,
                action_type,
                status,
                input,
                action_id,
                output,
            } => self.process_action(
                agent_id,
                session_id,
                &action_name,
                &action_type,
                status.as_deref(),
                input,
                action_id,
                output,
            ),
            AgentEvent::ToolCall {
                tool_name,
                status,
                reasoning,
                arguments,
            } => self.process_tool_call(
                agent_id,
                session_id,
                &tool_name,
                status.as_deref(),
                reasoning,
                arguments,
            ),
            AgentEvent::Completion {
                response,
                total_tokens,
                total_cost,
            } => self.process_completion(agent_id, session_id, response, total_tokens, total_cost),
            AgentEvent::Error { error, action_id } => {
                self.process_error(agent_id, session_id, &error, action_id)
            }
        };

        if let Err(e) = result {
            log::error!("Error processing agent event: {}", e);
        }
    }

    fn process_thought(
        &self,
        agent_id: &str,
        session_id: &str,
        thought_type: &str,
        content: &str,
        confidence: Option<f64>,
        processing_time_ms: Option<f64>,
    ) -> SqliteResult<()> {
        self.watcher
            .log_thought(agent_id, session_id, thought_type, content, confidence)?;

        // Thinking time rides along as a latency metric
        if let Some(processing_time) = processing_time_ms {
            self.watcher.log_telemetry(
                agent_id,
                session_id,
                "thinking_time",
                processing_time,
                "ms",
                "LATENCY",
            )?;
        }
        Ok(())
    }

    fn process_action(
        &self,
        agent_id: &str,
        session_id: &str,
        action_name: &str,
        action_type: &str,
        status: Option<&str>,
        input: Option<Value>,
        action_id: Option<i64>,
        output: Option<Value>,
    ) -> SqliteResult<()> {
        match status {
            Some("started") => {
                let input_data = input.as_ref().map(to_json_string);
                self.watcher.start_action(
                    agent_id,
                    session_id,
                    action_type,
                    action_name,
                    input_data.as_deref(),
                )?;
            }
            Some("completed") => match action_id {
                Some(action_id) => {
                    let output_data = output.as_ref().map(to_json_string);
                    self.watcher
                        .complete_action(action_id, output_data.as_deref())?;
                }
                None => log::debug!(
                    "Completed action event without action_id for session {}; skipping",
                    session_id
                ),
            },
            _ => {}
        }
        Ok(())
    }

    fn process_tool_call(
        &self,
        agent_id: &str,
        session_id: &str,
        tool_name: &str,
        status: Option<&str>,
        reasoning: Option<String>,
        arguments: Option<Value>,
    ) -> SqliteResult<()> {
        // Tool selection is recorded as a thought
        if status == Some("selected") {
            let reasoning =
                reasoning.unwrap_or_else(|| format!("Selected tool: {}", tool_name));
            self.watcher
                .log_thought(agent_id, session_id, "TOOL_SELECTION", &reasoning, None)?;
        }

        // The tool invocation itself is always recorded as an action
        let input_data = arguments.as_ref().map(to_json_string);
        self.watcher.start_action(
            agent_id,
            session_id,
            "TOOL_USE",
            tool_name,
            input_data.as_deref(),
        )?;
        Ok(())
    }

    fn process_completion(
        &self,
        agent_id: &str,
        session_id: &str,
        response: Option<String>,
        total_tokens: Option<f64>,
        total_cost: Option<f64>,
    ) -> SqliteResult<()> {
        self.watcher
            .complete_session(session_id, response.as_deref().unwrap_or_default())?;

        if let Some(tokens) = total_tokens {
            self.watcher.log_telemetry(
                agent_id,
                session_id,
                "total_tokens",
                tokens,
                "tokens",
                "TOKENS",
            )?;
        }
        if let Some(cost) = total_cost {
            self.watcher
                .log_telemetry(agent_id, session_id, "total_cost", cost, "usd", "COST")?;
        }
        Ok(())
    }

    fn process_error(
        &self,
        agent_id: &str,
        session_id: &str,
        error: &str,
        action_id: Option<i64>,
    ) -> SqliteResult<()> {
        if let Some(action_id) = action_id {
            self.watcher.fail_action(action_id, error)?;
        }

        self.watcher
            .log_thought(agent_id, session_id, "ERROR", error, Some(0.0))?;
        self.watcher
            .log_telemetry(agent_id, session_id, "errors", 1.0, "count", "ERROR_RATE")?;
        Ok(())
    }
}

/// Serialize an opaque payload field for storage, falling back to the
/// value's display form instead of failing the event.
fn to_json_string(value: &Value) -> String {
    match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            log::error!("Error serializing event payload: {}", e);
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{ActionStatus, SessionStatus};
    use serde_json::json;
    use tempfile::tempdir;

    fn test_parser() -> (tempfile::TempDir, Arc<WatcherService>, EventParser) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();
        let watcher = Arc::new(WatcherService::new(Arc::new(db)));
        let parser = EventParser::new(watcher.clone());
        (dir, watcher, parser)
    }

    #[test]
    fn test_thought_event_roundtrip_without_latency() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "thought", "thought_type": "REASONING", "content": "step 1", "confidence": 0.9}),
        );

        let thoughts = watcher.get_session_thoughts("sess-1").unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].thought_type, "REASONING");
        assert_eq!(thoughts[0].thought_content, "step 1");
        assert_eq!(thoughts[0].confidence_score, Some(0.9));
        // No processing_time_ms, so no latency metric
        assert!(watcher.get_session_metrics("sess-1").unwrap().is_empty());
    }

    #[test]
    fn test_thought_event_with_processing_time_logs_latency() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "thought", "content": "thinking", "processing_time_ms": 420}),
        );

        let metrics = watcher.get_session_metrics("sess-1").unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_name, "thinking_time");
        assert_eq!(metrics[0].metric_value, 420.0);
        assert_eq!(metrics[0].metric_unit, "ms");
        assert_eq!(metrics[0].metric_type, "LATENCY");
    }

    #[test]
    fn test_action_started_and_completed() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "action", "action_name": "fetch", "action_type": "API_CALL",
                   "status": "started", "input": {"url": "http://x"}}),
        );
        let actions = watcher.get_session_actions("sess-1").unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].status, ActionStatus::InProgress);
        assert_eq!(actions[0].input_data.as_deref(), Some("{\"url\":\"http://x\"}"));

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "action", "status": "completed", "action_id": actions[0].id,
                   "output": {"ok": true}}),
        );
        let actions = watcher.get_session_actions("sess-1").unwrap();
        assert_eq!(actions[0].status, ActionStatus::Completed);
        assert_eq!(actions[0].output_data.as_deref(), Some("{\"ok\":true}"));
    }

    #[test]
    fn test_action_completed_without_id_is_skipped() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "action", "status": "completed", "output": "ignored"}),
        );
        assert!(watcher.get_session_actions("sess-1").unwrap().is_empty());
    }

    #[test]
    fn test_tool_call_selected_logs_thought_and_action() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "tool_call", "tool_name": "search", "status": "selected",
                   "arguments": {"q": "rust"}}),
        );

        let thoughts = watcher.get_session_thoughts("sess-1").unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].thought_type, "TOOL_SELECTION");
        assert_eq!(thoughts[0].thought_content, "Selected tool: search");

        let actions = watcher.get_session_actions("sess-1").unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, "TOOL_USE");
        assert_eq!(actions[0].action_name, "search");
        assert_eq!(actions[0].input_data.as_deref(), Some("{\"q\":\"rust\"}"));
    }

    #[test]
    fn test_tool_call_other_status_still_starts_action() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "tool_call", "tool_name": "calc", "status": "running"}),
        );

        assert!(watcher.get_session_thoughts("sess-1").unwrap().is_empty());
        let actions = watcher.get_session_actions("sess-1").unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_name, "calc");
    }

    #[test]
    fn test_completion_event_completes_session_and_logs_metrics() {
        let (_dir, watcher, parser) = test_parser();
        let session = watcher.start_session("agent-1", "q").unwrap();

        parser.process_event(
            "agent-1",
            &session.session_id,
            json!({"type": "completion", "response": "all done",
                   "total_tokens": 1234, "total_cost": 0.05}),
        );

        let session = watcher.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(session.session_status, SessionStatus::Completed);
        assert_eq!(session.final_response.as_deref(), Some("all done"));

        let metrics = watcher.get_session_metrics(&session.session_id).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].metric_name, "total_tokens");
        assert_eq!(metrics[1].metric_name, "total_cost");
        assert_eq!(metrics[1].metric_unit, "usd");
    }

    #[test]
    fn test_error_event_without_action_id() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "error", "error": "rate limited"}),
        );

        let thoughts = watcher.get_session_thoughts("sess-1").unwrap();
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].thought_type, "ERROR");
        assert_eq!(thoughts[0].confidence_score, Some(0.0));

        let metrics = watcher.get_session_metrics("sess-1").unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].metric_name, "errors");
        assert_eq!(metrics[0].metric_value, 1.0);
        assert_eq!(metrics[0].metric_type, "ERROR_RATE");

        // No action was touched
        assert!(watcher.get_session_actions("sess-1").unwrap().is_empty());
    }

    #[test]
    fn test_error_event_with_action_id_fails_action() {
        let (_dir, watcher, parser) = test_parser();
        let action = watcher
            .start_action("agent-1", "sess-1", "API_CALL", "fetch", None)
            .unwrap();

        parser.process_event(
            "agent-1",
            "sess-1",
            json!({"type": "error", "error": "timeout", "action_id": action.id}),
        );

        let actions = watcher.get_session_actions("sess-1").unwrap();
        assert_eq!(actions[0].status, ActionStatus::Failed);
        assert_eq!(actions[0].error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_unknown_event_type_is_dropped() {
        let (_dir, watcher, parser) = test_parser();

        parser.process_event("agent-1", "sess-1", json!({"type": "telepathy", "x": 1}));
        parser.process_event("agent-1", "sess-1", json!("not even an object"));

        assert!(watcher.get_session_thoughts("sess-1").unwrap().is_empty());
        assert!(watcher.get_session_actions("sess-1").unwrap().is_empty());
        assert!(watcher.get_session_metrics("sess-1").unwrap().is_empty());
    }
}
