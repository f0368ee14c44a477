//! Deduplicating violation log.
//!
//! Reported violations are grouped into equivalence classes by the entry
//! type's ordering: two entries comparing equal describe the same problem.
//! Each class keeps the shortest trace seen so far, on disk as
//! `<dir>/<session>_<id>.trace`.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gmc_explore::traversal::trace::{TraceSource, STEPS_KEY};
use tracing::{debug, info};

use crate::config::{validate_session_name, ConfigError, SessionConfig};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot write trace {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A violation the log can store. Equality under `Ord` defines the
/// equivalence class; iteration follows the same order, so lower entries
/// print first. `Display` is the body shown in the summary.
pub trait LogEntry: Ord + fmt::Display {}

impl<T: Ord + fmt::Display> LogEntry for T {}

/// What the log keeps for one equivalence class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Assigned in discovery order, never reused.
    pub id: usize,
    /// Depth of the stored trace.
    pub size: usize,
    pub trace_file: PathBuf,
}

/// Result of [`ViolationLog::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// First violation of a new class.
    Logged { id: usize },
    /// Shorter trace for a known class; the trace file was rewritten.
    Replaced {
        id: usize,
        old_size: usize,
        new_size: usize,
    },
    /// Known class and no shorter than what is stored.
    Ignored { id: usize },
}

impl ReportOutcome {
    pub fn id(&self) -> usize {
        match *self {
            ReportOutcome::Logged { id }
            | ReportOutcome::Replaced { id, .. }
            | ReportOutcome::Ignored { id } => id,
        }
    }
}

pub struct ViolationLog<E: LogEntry> {
    directory: PathBuf,
    session_name: String,
    created: DateTime<Utc>,
    entries: BTreeMap<E, EntryRecord>,
    num_errors: usize,
    error_bound: usize,
}

impl<E: LogEntry> ViolationLog<E> {
    /// Opens a log in `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>, session_name: &str) -> Result<Self, ConfigError> {
        let directory = directory.into();
        validate_session_name(session_name)?;
        if directory.exists() {
            if !directory.is_dir() {
                return Err(ConfigError::NotADirectory(directory));
            }
        } else {
            fs::create_dir_all(&directory).map_err(|source| ConfigError::CreateDir {
                path: directory.clone(),
                source,
            })?;
        }
        Ok(Self {
            directory,
            session_name: session_name.to_string(),
            created: Utc::now(),
            entries: BTreeMap::new(),
            num_errors: 0,
            error_bound: SessionConfig::default().error_bound,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut log = Self::new(&config.log_dir, &config.session_name)?;
        log.error_bound = config.error_bound;
        Ok(log)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// When the log was opened.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Total violations reported, duplicates included.
    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    /// Distinct equivalence classes.
    pub fn num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn error_bound(&self) -> usize {
        self.error_bound
    }

    pub fn set_error_bound(&mut self, bound: usize) {
        self.error_bound = bound;
    }

    /// The log never refuses a report; callers decide whether to stop.
    pub fn bound_reached(&self) -> bool {
        self.num_errors >= self.error_bound
    }

    /// Entries in priority order.
    pub fn entries(&self) -> impl Iterator<Item = (&E, &EntryRecord)> {
        self.entries.iter()
    }

    pub fn get(&self, id: usize) -> Option<(&E, &EntryRecord)> {
        self.entries.iter().find(|(_, record)| record.id == id)
    }

    pub fn trace_path(&self, id: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{}.trace", self.session_name, id))
    }

    /// Records a violation whose witness is held by `source`.
    pub fn report<T>(&mut self, entry: E, source: &T) -> Result<ReportOutcome, LogError>
    where
        T: TraceSource + ?Sized,
    {
        let length = source.depth();
        info!(
            error = self.num_errors,
            depth = length,
            "Error {} encountered at depth {}",
            self.num_errors,
            length
        );

        let existing = self.entries.get(&entry).cloned();
        let outcome = match existing {
            None => {
                let id = self.entries.len();
                let trace_file = self.trace_path(id);
                self.persist(&trace_file, id, source)?;
                info!(id, file = %trace_file.display(), "new violation logged");
                self.entries.insert(
                    entry,
                    EntryRecord {
                        id,
                        size: length,
                        trace_file,
                    },
                );
                ReportOutcome::Logged { id }
            }
            Some(record) if length < record.size => {
                self.persist(&record.trace_file, record.id, source)?;
                info!(
                    id = record.id,
                    old = record.size,
                    new = length,
                    "replacing old trace with shorter one"
                );
                // The stored key is swapped too, so the summary shows the
                // entry matching the trace on disk.
                self.entries.remove(&entry);
                let outcome = ReportOutcome::Replaced {
                    id: record.id,
                    old_size: record.size,
                    new_size: length,
                };
                self.entries.insert(
                    entry,
                    EntryRecord {
                        size: length,
                        ..record
                    },
                );
                outcome
            }
            Some(record) => {
                debug!(
                    id = record.id,
                    stored = record.size,
                    depth = length,
                    "new trace is not shorter, ignoring"
                );
                ReportOutcome::Ignored { id: record.id }
            }
        };

        self.num_errors += 1;
        Ok(outcome)
    }

    /// Writes the summary: header, then every entry in priority order.
    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Session name....... {}", self.session_name)?;
        writeln!(out, "Directory.......... {}", self.directory.display())?;
        writeln!(
            out,
            "Date............... {}",
            self.created.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out, "numErrors.......... {}", self.num_errors)?;
        writeln!(out, "numDistinctErrors.. {}", self.entries.len())?;
        for (entry, record) in &self.entries {
            writeln!(out)?;
            writeln!(
                out,
                "Error {}[length={}, file={}]:",
                record.id,
                record.size,
                record.trace_file.display()
            )?;
            writeln!(out, "{entry}")?;
        }
        out.flush()
    }

    /// Writes to `<path>.tmp` then renames, so a reader never sees a
    /// half-written replacement.
    fn persist<T>(&self, path: &Path, id: usize, source: &T) -> Result<(), LogError>
    where
        T: TraceSource + ?Sized,
    {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let preamble = [
            format!("Session: {}", self.session_name),
            format!("Violation: {id}"),
            format!("{STEPS_KEY} {}", source.steps()),
        ];
        let io_err = |source: io::Error| LogError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        source.write_trace(&mut writer, &preamble).map_err(io_err)?;
        let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}

impl<E: LogEntry> fmt::Debug for ViolationLog<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViolationLog")
            .field("directory", &self.directory)
            .field("session_name", &self.session_name)
            .field("created", &self.created)
            .field("num_errors", &self.num_errors)
            .field("num_entries", &self.entries.len())
            .field("error_bound", &self.error_bound)
            .finish()
    }
}
