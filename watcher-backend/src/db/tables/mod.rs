//! Database query modules - extends Database with per-table methods
//!
//! Each module adds `impl Database` blocks with methods for one entity table.

mod actions; // agent_actions
mod sessions; // agent_sessions (+ counter and status updates)
mod telemetry; // agent_telemetry
mod thoughts; // agent_thoughts
