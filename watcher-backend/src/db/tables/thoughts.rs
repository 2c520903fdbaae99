//! Agent thought database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::Thought;

impl Database {
    /// Insert a thought row. The timestamp is assigned here, at write time.
    pub fn insert_thought(
        &self,
        agent_id: &str,
        session_id: &str,
        thought_type: &str,
        thought_content: &str,
        confidence_score: Option<f64>,
    ) -> SqliteResult<Thought> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agent_thoughts (agent_id, session_id, thought_type, thought_content, confidence_score, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                agent_id,
                session_id,
                thought_type,
                thought_content,
                confidence_score,
                &now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Thought {
            id,
            agent_id: agent_id.to_string(),
            session_id: session_id.to_string(),
            thought_type: thought_type.to_string(),
            thought_content: thought_content.to_string(),
            confidence_score,
            timestamp: now,
            parent_thought_id: None,
            metadata: None,
        })
    }

    /// Get all thoughts for a session in chronological order
    pub fn list_thoughts_by_session(&self, session_id: &str) -> SqliteResult<Vec<Thought>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, agent_id, session_id, thought_type, thought_content, confidence_score,
             timestamp, parent_thought_id, metadata
             FROM agent_thoughts WHERE session_id = ?1 ORDER BY timestamp ASC",
        )?;

        let thoughts = stmt
            .query_map([session_id], |row| Self::row_to_thought(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(thoughts)
    }

    fn row_to_thought(row: &rusqlite::Row) -> rusqlite::Result<Thought> {
        let timestamp_str: String = row.get(6)?;

        Ok(Thought {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            session_id: row.get(2)?,
            thought_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            thought_content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            confidence_score: row.get(5)?,
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .unwrap()
                .with_timezone(&Utc),
            parent_thought_id: row.get(7)?,
            metadata: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_insert_and_list_thoughts_in_order() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        // No session row needed - soft reference only
        db.insert_thought("agent-1", "sess-1", "PLANNING", "step 1", Some(0.9))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        db.insert_thought("agent-1", "sess-1", "REASONING", "step 2", None)
            .unwrap();
        db.insert_thought("agent-1", "other", "REASONING", "elsewhere", None)
            .unwrap();

        let thoughts = db.list_thoughts_by_session("sess-1").unwrap();
        assert_eq!(thoughts.len(), 2);
        assert_eq!(thoughts[0].thought_content, "step 1");
        assert_eq!(thoughts[0].confidence_score, Some(0.9));
        assert_eq!(thoughts[1].thought_content, "step 2");
        assert!(thoughts[0].timestamp <= thoughts[1].timestamp);
        assert!(thoughts[0].parent_thought_id.is_none());
    }
}
