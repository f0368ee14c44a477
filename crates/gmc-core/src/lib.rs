pub mod config;
pub mod log;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use log::{EntryRecord, LogEntry, LogError, ReportOutcome, ViolationLog};
pub use session::{Session, SessionError, SessionReport, StopReason};
