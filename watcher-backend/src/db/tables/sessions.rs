//! Agent session database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::{Session, SessionStatus};

impl Database {
    /// Insert a new session row with status ACTIVE and zeroed counters
    pub fn insert_session(
        &self,
        session_id: &str,
        agent_id: &str,
        user_query: &str,
    ) -> SqliteResult<Session> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agent_sessions (session_id, agent_id, user_query, session_status, start_time, total_thoughts, total_actions)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 0)",
            rusqlite::params![
                session_id,
                agent_id,
                user_query,
                SessionStatus::Active.as_str(),
                &now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Session {
            id,
            session_id: session_id.to_string(),
            agent_id: agent_id.to_string(),
            user_query: user_query.to_string(),
            session_status: SessionStatus::Active,
            start_time: now,
            end_time: None,
            total_thoughts: 0,
            total_actions: 0,
            final_response: None,
        })
    }

    /// Get a session by its externally-visible session identifier
    pub fn get_session_by_session_id(&self, session_id: &str) -> SqliteResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, session_id, agent_id, user_query, session_status, start_time, end_time,
             total_thoughts, total_actions, final_response
             FROM agent_sessions WHERE session_id = ?1",
        )?;

        let session = stmt
            .query_row([session_id], |row| Self::row_to_session(row))
            .ok();

        Ok(session)
    }

    /// List all sessions for an agent, most recently started first
    pub fn list_sessions_by_agent(&self, agent_id: &str) -> SqliteResult<Vec<Session>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, session_id, agent_id, user_query, session_status, start_time, end_time,
             total_thoughts, total_actions, final_response
             FROM agent_sessions WHERE agent_id = ?1 ORDER BY start_time DESC",
        )?;

        let sessions = stmt
            .query_map([agent_id], |row| Self::row_to_session(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(sessions)
    }

    /// Bump the cached thought counter. A single UPDATE so concurrent bumps
    /// cannot lose increments. Returns false when no such session exists.
    pub fn increment_session_thoughts(&self, session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE agent_sessions SET total_thoughts = total_thoughts + 1 WHERE session_id = ?1",
            [session_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Bump the cached action counter; same contract as the thought counter
    pub fn increment_session_actions(&self, session_id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows_affected = conn.execute(
            "UPDATE agent_sessions SET total_actions = total_actions + 1 WHERE session_id = ?1",
            [session_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Mark a session COMPLETED with its final response and end time.
    /// Returns false when no such session exists.
    pub fn complete_session_row(
        &self,
        session_id: &str,
        final_response: &str,
    ) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        let rows_affected = conn.execute(
            "UPDATE agent_sessions SET session_status = ?1, end_time = ?2, final_response = ?3
             WHERE session_id = ?4",
            rusqlite::params![
                SessionStatus::Completed.as_str(),
                &now,
                final_response,
                session_id
            ],
        )?;

        Ok(rows_affected > 0)
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
        let status_str: String = row.get(4)?;
        let start_time_str: String = row.get(5)?;
        let end_time_str: Option<String> = row.get(6)?;

        Ok(Session {
            id: row.get(0)?,
            session_id: row.get(1)?,
            agent_id: row.get(2)?,
            user_query: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            session_status: SessionStatus::from_str(&status_str).unwrap_or_default(),
            start_time: DateTime::parse_from_rfc3339(&start_time_str)
                .unwrap()
                .with_timezone(&Utc),
            end_time: end_time_str.map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .unwrap()
                    .with_timezone(&Utc)
            }),
            total_thoughts: row.get(7)?,
            total_actions: row.get(8)?,
            final_response: row.get(9)?,
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
        let db = Database::new(path.to_str().unwrap()).expect("Failed to create database");
        (dir, db)
    }

    #[test]
    fn test_insert_and_get_session() {
        let (_dir, db) = test_db();

        let session = db
            .insert_session("sess-1", "agent-1", "what is rust")
            .unwrap();
        assert_eq!(session.session_status, SessionStatus::Active);
        assert!(session.end_time.is_none());
        assert_eq!(session.total_thoughts, 0);

        let fetched = db.get_session_by_session_id("sess-1").unwrap().unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.agent_id, "agent-1");
        assert_eq!(fetched.user_query, "what is rust");

        assert!(db.get_session_by_session_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_counter_increments() {
        let (_dir, db) = test_db();
        db.insert_session("sess-1", "agent-1", "q").unwrap();

        assert!(db.increment_session_thoughts("sess-1").unwrap());
        assert!(db.increment_session_thoughts("sess-1").unwrap());
        assert!(db.increment_session_actions("sess-1").unwrap());
        // Unknown session is reported, not an error
        assert!(!db.increment_session_thoughts("missing").unwrap());

        let session = db.get_session_by_session_id("sess-1").unwrap().unwrap();
        assert_eq!(session.total_thoughts, 2);
        assert_eq!(session.total_actions, 1);
    }

    #[test]
    fn test_complete_session_row() {
        let (_dir, db) = test_db();
        let created = db.insert_session("sess-1", "agent-1", "q").unwrap();

        assert!(db.complete_session_row("sess-1", "all done").unwrap());
        assert!(!db.complete_session_row("missing", "nope").unwrap());

        let session = db.get_session_by_session_id("sess-1").unwrap().unwrap();
        assert_eq!(session.session_status, SessionStatus::Completed);
        assert_eq!(session.final_response.as_deref(), Some("all done"));
        assert!(session.end_time.unwrap() >= created.start_time);
    }

    #[test]
    fn test_list_sessions_by_agent_orders_newest_first() {
        let (_dir, db) = test_db();
        db.insert_session("sess-1", "agent-1", "first").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.insert_session("sess-2", "agent-1", "second").unwrap();
        db.insert_session("sess-3", "agent-2", "other agent").unwrap();

        let sessions = db.list_sessions_by_agent("agent-1").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "sess-2");
        assert_eq!(sessions[1].session_id, "sess-1");
    }
}
