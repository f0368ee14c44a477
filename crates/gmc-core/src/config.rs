//! Session configuration.
//!
//! A plain value consumed by the log and the session driver. Parsing it from
//! a command line is the embedder's business; loading from JSON is supported
//! because that is how sessions are usually scripted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session name is empty")]
    EmptySessionName,

    #[error("session name '{0}' must not contain path separators")]
    InvalidSessionName(String),

    #[error("no directory named {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot create log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for one checking session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the session's trace files. Created if missing.
    pub log_dir: PathBuf,
    /// Prefix of every file the session writes.
    pub session_name: String,
    /// Number of reported errors after which the session driver stops
    /// searching. Advisory for the log itself.
    pub error_bound: usize,
    /// Emit per-step search events.
    pub debug: bool,
    /// Treat a cycle in the state space as a violation.
    pub report_cycle_as_violation: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("GMCREP"),
            session_name: "gmc".to_string(),
            error_bound: 10,
            debug: false,
            report_cycle_as_violation: false,
        }
    }
}

impl SessionConfig {
    pub fn new(log_dir: impl Into<PathBuf>, session_name: &str) -> Self {
        Self {
            log_dir: log_dir.into(),
            session_name: session_name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that don't touch the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_session_name(&self.session_name)
    }
}

/// A session name becomes a file name prefix inside the log directory, so
/// it must be non-blank and free of path separators.
pub fn validate_session_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptySessionName);
    }
    if name.contains(['/', '\\']) {
        return Err(ConfigError::InvalidSessionName(name.to_string()));
    }
    Ok(())
}
