use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

pub struct Database {
    pub(super) conn: Mutex<Connection>,
}

impl Database {
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        // Agent sessions table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT UNIQUE NOT NULL,
                agent_id TEXT NOT NULL,
                user_query TEXT,
                session_status TEXT NOT NULL DEFAULT 'ACTIVE',
                start_time TEXT NOT NULL,
                end_time TEXT,
                total_thoughts INTEGER NOT NULL DEFAULT 0,
                total_actions INTEGER NOT NULL DEFAULT 0,
                final_response TEXT
            )",
            [],
        )?;

        // Agent thoughts table (session_id is a soft reference, no FK)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_thoughts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                thought_type TEXT,
                thought_content TEXT,
                confidence_score REAL,
                timestamp TEXT NOT NULL,
                parent_thought_id INTEGER,
                metadata TEXT
            )",
            [],
        )?;

        // Agent actions table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_actions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                action_type TEXT,
                action_name TEXT,
                input_data TEXT,
                output_data TEXT,
                status TEXT NOT NULL DEFAULT 'STARTED',
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration_ms INTEGER,
                error_message TEXT,
                related_thought_id INTEGER
            )",
            [],
        )?;

        // Agent telemetry table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS agent_telemetry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                metric_name TEXT,
                metric_value REAL,
                metric_unit TEXT,
                metric_type TEXT,
                timestamp TEXT NOT NULL,
                tags TEXT
            )",
            [],
        )?;

        // Indexes backing the ordered per-session and per-agent listings
        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_sessions_agent_id ON agent_sessions (agent_id, start_time)",
            "CREATE INDEX IF NOT EXISTS idx_thoughts_session_id ON agent_thoughts (session_id, timestamp)",
            "CREATE INDEX IF NOT EXISTS idx_thoughts_agent_id ON agent_thoughts (agent_id)",
            "CREATE INDEX IF NOT EXISTS idx_actions_session_id ON agent_actions (session_id, start_time)",
            "CREATE INDEX IF NOT EXISTS idx_actions_agent_id ON agent_actions (agent_id)",
            "CREATE INDEX IF NOT EXISTS idx_telemetry_session_id ON agent_telemetry (session_id, timestamp)",
            "CREATE INDEX IF NOT EXISTS idx_telemetry_agent_id ON agent_telemetry (agent_id)",
        ];
        for sql in indexes {
            conn.execute(sql, [])?;
        }

        Ok(())
    }
}
