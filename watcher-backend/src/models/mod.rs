pub mod action;
pub mod session;
pub mod telemetry;
pub mod thought;
pub mod timeline;

pub use action::{Action, ActionStatus, LogActionRequest};
pub use session::{CompleteSessionRequest, Session, SessionStatus, StartSessionRequest};
pub use telemetry::{LogMetricRequest, Telemetry};
pub use thought::{LogThoughtRequest, Thought};
pub use timeline::TimelineEntry;
