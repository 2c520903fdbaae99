pub mod health;
pub mod sessions;
pub mod streams;
pub mod telemetry;
