//! Agent telemetry database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use super::super::Database;
use crate::models::Telemetry;

impl Database {
    /// Insert a metric row. Append-only; rows are never updated.
    pub fn insert_telemetry(
        &self,
        agent_id: &str,
        session_id: &str,
        metric_name: &str,
        metric_value: f64,
        metric_unit: &str,
        metric_type: &str,
    ) -> SqliteResult<Telemetry> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO agent_telemetry (agent_id, session_id, metric_name, metric_value, metric_unit, metric_type, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                agent_id,
                session_id,
                metric_name,
                metric_value,
                metric_unit,
                metric_type,
                &now.to_rfc3339(),
            ],
        )?;

        let id = conn.last_insert_rowid();

        Ok(Telemetry {
            id,
            agent_id: agent_id.to_string(),
            session_id: session_id.to_string(),
            metric_name: metric_name.to_string(),
            metric_value,
            metric_unit: metric_unit.to_string(),
            metric_type: metric_type.to_string(),
            timestamp: now,
            tags: None,
        })
    }

    /// Get all metrics for a session in chronological order
    pub fn list_telemetry_by_session(&self, session_id: &str) -> SqliteResult<Vec<Telemetry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, agent_id, session_id, metric_name, metric_value, metric_unit, metric_type, timestamp, tags
             FROM agent_telemetry WHERE session_id = ?1 ORDER BY timestamp ASC",
        )?;

        let metrics = stmt
            .query_map([session_id], |row| Self::row_to_telemetry(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(metrics)
    }

    fn row_to_telemetry(row: &rusqlite::Row) -> rusqlite::Result<Telemetry> {
        let timestamp_str: String = row.get(7)?;

        Ok(Telemetry {
            id: row.get(0)?,
            agent_id: row.get(1)?,
            session_id: row.get(2)?,
            metric_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            metric_value: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
            metric_unit: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            metric_type: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                .unwrap()
                .with_timezone(&Utc),
            tags: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_insert_and_list_telemetry() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("test.db").to_str().unwrap()).unwrap();

        let metric = db
            .insert_telemetry("agent-1", "sess-1", "thinking_time", 120.5, "ms", "LATENCY")
            .unwrap();
        assert_eq!(metric.metric_value, 120.5);
        db.insert_telemetry("agent-1", "sess-1", "errors", 1.0, "count", "ERROR_RATE")
            .unwrap();
        db.insert_telemetry("agent-1", "other", "total_cost", 0.02, "usd", "COST")
            .unwrap();

        let metrics = db.list_telemetry_by_session("sess-1").unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].metric_name, "thinking_time");
        assert_eq!(metrics[1].metric_type, "ERROR_RATE");
        assert!(metrics[0].tags.is_none());
    }
}
