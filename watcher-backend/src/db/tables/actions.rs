//! Agent action database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{Action, ActionStatus};

impl Database {
    /// Insert an action row in the IN_PROGRESS state with start time now
    pub fn insert_action(
        &self,
        agent_id: &str,
        session_id: &str,
        action_type: &str,
        action_name: &str,
        input_data: Option<&str>,
    ) -> SqliteResult<Action> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agent_actions (agent_id, session_id, action_type, action_name, input_data, status, start_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                agent_id,
                session_id,
                action_type,
                action_name,
                input_data,
                ActionStatus::InProgress.as_str(),
                &now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Action {
            id,
            agent_id: agent_id.to_string(),
            session_id: session_id.to_string(),
            action_type: action_type.to_string(),
            action_name: action_name.to_string(),
            input_data: input_data.map(|s| s.to_string()),
            output_data: None,
            status: ActionStatus::InProgress,
            start_time: now,
            end_time: None,
            duration_ms: None,
            error_message: None,
            related_thought_id: None,
        })
    }

    /// Get an action by its numeric id
    pub fn get_action(&self, id: i64) -> SqliteResult<Option<Action>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, agent_id, session_id, action_type, action_name, input_data, output_data,
             status, start_time, end_time, duration_ms, error_message, related_thought_id
             FROM agent_actions WHERE id = ?1",
        )?;

        let action = stmt.query_row([id], |row| Self::row_to_action(row)).ok();

        Ok(action)
    }

    /// Mark an action COMPLETED with its output, end time and computed
    /// duration. Returns the updated row, or None when the id is unknown.
    pub fn complete_action_row(
        &self,
        id: i64,
        output_data: Option<&str>,
    ) -> SqliteResult<Option<Action>> {
        self.finish_action_row(id, ActionStatus::Completed, output_data, None)
    }

    /// Mark an action FAILED with its error message, end time and computed
    /// duration. Returns the updated row, or None when the id is unknown.
    pub fn fail_action_row(&self, id: i64, error_message: &str) -> SqliteResult<Option<Action>> {
        self.finish_action_row(id, ActionStatus::Failed, None, Some(error_message))
    }

    fn finish_action_row(
        &self,
        id: i64,
        status: ActionStatus,
        output_data: Option<&str>,
        error_message: Option<&str>,
    ) -> SqliteResult<Option<Action>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, agent_id, session_id, action_type, action_name, input_data, output_data,
             status, start_time, end_time, duration_ms, error_message, related_thought_id
             FROM agent_actions WHERE id = ?1",
        )?;
        let Some(mut action) = stmt.query_row([id], |row| Self::row_to_action(row)).ok() else {
            return Ok(None);
        };
        drop(stmt);

        let now = Utc::now();
        let duration_ms = (now - action.start_time).num_milliseconds();

        conn.execute(
            "UPDATE agent_actions SET status = ?1, output_data = ?2, error_message = ?3,
             end_time = ?4, duration_ms = ?5 WHERE id = ?6",
            rusqlite::params![
                status.as_str(),
                output_data.or(action.output_data.as_deref()),
                error_message,
                &now.to_rfc3339(),
                duration_ms,
                id
            ],
        )?;

        action.status = status;
        if output_data.is_some() {
            action.output_data = output_data.map(|s| s.to_string());
        }
        action.error_message = error_message.map(|s| s.to_string());
        action.end_time = Some(now);
        action.duration_ms = Some(duration_ms);

        Ok(Some(action))
    }

    /// Get all actions for a session ordered by start time
    pub fn list_actions_by_session(&self, session_id: &str) -> SqliteResult<Vec<Action>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, agent_id, session_id, action_type, action_name, input_data, output_data,
             status, start_time, end_time, duration_ms, error_message, related_thought_id
             FROM agent_actions WHERE session_id = ?1 ORDER BY start_time ASC",
        )?;

        let actions = stmt
            .query_map([session_id], |row| Self::row_to_action(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(actions)
    }

    fn row_to_action(row: &rusqlite::Row) -> rusqlite::Result<Action> {
        let status_str: String = row.get(7)?;
        let start_time_str: String = row.get(8)?;
        let end_time_str: Option<String> = row.get(9)?;

        Ok(Action {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            session_id: row.get(2)?,
            action_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            action_name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            input_data: row.get(5)?,
            output_data: row.get(6)?,
            status: ActionStatus::from_str(&status_str).unwrap_or_default(),
            start_time: DateTime::parse_from_rfc3339(&start_time_str)
                .unwrap()
                .with_timezone(&Utc),
            end_time: end_time_str.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .unwrap()
                    .with_timezone(&Utc)
            }),
            duration_ms: row.get(10)?,
            error_message: row.get(11)?,
            related_thought_id: row.get(12)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_action_lifecycle_complete() {
        let (_dir, db) = test_db();

        let action = db
            .insert_action("agent-1", "sess-1", "API_CALL", "fetch", Some("{\"q\":1}"))
            .unwrap();
        assert_eq!(action.status, ActionStatus::InProgress);
        assert!(action.end_time.is_none());

        let updated = db
            .complete_action_row(action.id, Some("{\"ok\":true}"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ActionStatus::Completed);
        assert_eq!(updated.output_data.as_deref(), Some("{\"ok\":true}"));
        assert!(updated.duration_ms.unwrap() >= 0);
        assert!(updated.end_time.unwrap() >= updated.start_time);

        // Round-trips through the row mapper too
        let fetched = db.get_action(action.id).unwrap().unwrap();
        assert_eq!(fetched.status, ActionStatus::Completed);
        assert_eq!(fetched.error_message, None);
    }

    #[test]
    fn test_action_lifecycle_fail() {
        let (_dir, db) = test_db();

        let action = db
            .insert_action("agent-1", "sess-1", "TOOL_USE", "search", None)
            .unwrap();
        let failed = db
            .fail_action_row(action.id, "connection refused")
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, ActionStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("connection refused"));
        assert!(failed.output_data.is_none());
        assert!(failed.duration_ms.is_some());
    }

    #[test]
    fn test_finish_unknown_action_is_noop() {
        let (_dir, db) = test_db();
        assert!(db.complete_action_row(999, None).unwrap().is_none());
        assert!(db.fail_action_row(999, "boom").unwrap().is_none());
    }

    #[test]
    fn test_list_actions_ordered_by_start() {
        let (_dir, db) = test_db();
        db.insert_action("agent-1", "sess-1", "API_CALL", "first", None)
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.insert_action("agent-1", "sess-1", "API_CALL", "second", None)
            .unwrap();

        let actions = db.list_actions_by_session("sess-1").unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action_name, "first");
        assert_eq!(actions[1].action_name, "second");
    }
}
