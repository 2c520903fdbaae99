//! Watcher service - the single orchestration point for recording agent
//! activity. Creates sessions, appends thoughts/actions/metrics, keeps the
//! cached per-session counters in step, and finalizes sessions and actions.
//!
//! Every mutating call commits independently; the counters on the session row
//! are a cached denormalization of the child tables, not a source of truth.
//! Missing write targets (completing an unknown action or session) are
//! treated as best-effort no-ops rather than errors.

use rusqlite::Result as SqliteResult;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Action, Session, Telemetry, Thought, TimelineEntry};

pub struct WatcherService {
    db: Arc<Database>,
}

impl WatcherService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Start a new agent session with a fresh unique session identifier.
    /// Empty agent ids and queries are accepted and stored as-is.
    pub fn start_session(&self, agent_id: &str, user_query: &str) -> SqliteResult<Session> {
        let session_id = Uuid::new_v4().to_string();
        let session = self.db.insert_session(&session_id, agent_id, user_query)?;
        log::info!(
            "Started new agent session: {} for agent: {}",
            session_id,
            agent_id
        );
        Ok(session)
    }

    /// Log an agent thought and bump the session's thought counter. The
    /// thought is persisted even when the session was never started.
    pub fn log_thought(
        &self,
        agent_id: &str,
        session_id: &str,
        thought_type: &str,
        content: &str,
        confidence_score: Option<f64>,
    ) -> SqliteResult<Thought> {
        let thought =
            self.db
                .insert_thought(agent_id, session_id, thought_type, content, confidence_score)?;

        if !self.db.increment_session_thoughts(session_id)? {
            log::debug!("No session {} to count thought against", session_id);
        }

        let preview: String = content.chars().take(50).collect();
        log::info!(
            "Logged thought [{}] for session {}: {}",
            thought_type,
            session_id,
            preview
        );
        Ok(thought)
    }

    /// Log the start of an agent action and bump the session's action counter
    pub fn start_action(
        &self,
        agent_id: &str,
        session_id: &str,
        action_type: &str,
        action_name: &str,
        input_data: Option<&str>,
    ) -> SqliteResult<Action> {
        let action =
            self.db
                .insert_action(agent_id, session_id, action_type, action_name, input_data)?;

        if !self.db.increment_session_actions(session_id)? {
            log::debug!("No session {} to count action against", session_id);
        }

        log::info!(
            "Started action [{}] {} for session {}",
            action_type,
            action_name,
            session_id
        );
        Ok(action)
    }

    /// Complete an action by numeric id. Unknown ids are a silent no-op.
    pub fn complete_action(&self, action_id: i64, output_data: Option<&str>) -> SqliteResult<()> {
        match self.db.complete_action_row(action_id, output_data)? {
            Some(action) => log::info!(
                "Completed action {} for session {}",
                action.action_name,
                action.session_id
            ),
            None => log::debug!("Ignoring completion of unknown action {}", action_id),
        }
        Ok(())
    }

    /// Fail an action by numeric id. Unknown ids are a silent no-op.
    pub fn fail_action(&self, action_id: i64, error_message: &str) -> SqliteResult<()> {
        match self.db.fail_action_row(action_id, error_message)? {
            Some(action) => log::error!(
                "Action {} failed for session {}: {}",
                action.action_name,
                action.session_id,
                error_message
            ),
            None => log::debug!("Ignoring failure of unknown action {}", action_id),
        }
        Ok(())
    }

    /// Record a telemetry metric. No session linkage side effect.
    pub fn log_telemetry(
        &self,
        agent_id: &str,
        session_id: &str,
        metric_name: &str,
        metric_value: f64,
        metric_unit: &str,
        metric_type: &str,
    ) -> SqliteResult<()> {
        self.db.insert_telemetry(
            agent_id,
            session_id,
            metric_name,
            metric_value,
            metric_unit,
            metric_type,
        )?;
        log::debug!(
            "Logged telemetry {}: {} {} for session {}",
            metric_name,
            metric_value,
            metric_unit,
            session_id
        );
        Ok(())
    }

    /// Complete a session with its final response. Unknown session ids are a
    /// silent no-op.
    pub fn complete_session(&self, session_id: &str, final_response: &str) -> SqliteResult<()> {
        if self.db.complete_session_row(session_id, final_response)? {
            log::info!("Completed session: {}", session_id);
        } else {
            log::debug!("Ignoring completion of unknown session {}", session_id);
        }
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> SqliteResult<Option<Session>> {
        self.db.get_session_by_session_id(session_id)
    }

    pub fn get_session_thoughts(&self, session_id: &str) -> SqliteResult<Vec<Thought>> {
        self.db.list_thoughts_by_session(session_id)
    }

    pub fn get_session_actions(&self, session_id: &str) -> SqliteResult<Vec<Action>> {
        self.db.list_actions_by_session(session_id)
    }

    pub fn get_session_metrics(&self, session_id: &str) -> SqliteResult<Vec<Telemetry>> {
        self.db.list_telemetry_by_session(session_id)
    }

    pub fn get_agent_sessions(&self, agent_id: &str) -> SqliteResult<Vec<Session>> {
        self.db.list_sessions_by_agent(agent_id)
    }

    /// Thoughts and actions for a session merged into one chronological list
    pub fn get_session_timeline(&self, session_id: &str) -> SqliteResult<Vec<TimelineEntry>> {
        let thoughts = self.db.list_thoughts_by_session(session_id)?;
        let actions = self.db.list_actions_by_session(session_id)?;

        let mut entries: Vec<TimelineEntry> = thoughts
            .into_iter()
            .map(TimelineEntry::from)
            .chain(actions.into_iter().map(TimelineEntry::from))
            .collect();
        entries.sort_by_key(|e| e.timestamp);

        Ok(entries)
    }
}
