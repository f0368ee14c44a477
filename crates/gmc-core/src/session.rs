use std::io::{self, Write};

use gmc_explore::traversal::engine::DfsSearcher;
use gmc_explore::traversal::outcome::{SearchOutcome, SearchStats};
use gmc_model::{Enabler, StateManager, StatePredicate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ConfigError, SessionConfig};
use crate::log::{LogEntry, LogError, ViolationLog};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error("report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why [`Session::explore`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No reachable state is left to visit.
    Exhausted,
    /// The log's error bound was reached.
    ErrorBoundReached,
}

/// Result of one [`Session::explore`] run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_name: String,
    pub stats: SearchStats,
    /// Hits reported to the log, duplicates included.
    pub errors_reported: usize,
    /// Equivalence classes in the log afterwards.
    pub distinct_errors: usize,
    pub stop_reason: StopReason,
}

impl SessionReport {
    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A checking session: one configuration and one violation log, fed by as
/// many searches as the caller runs.
pub struct Session<L: LogEntry> {
    config: SessionConfig,
    log: ViolationLog<L>,
}

impl<L: LogEntry> Session<L> {
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let log = ViolationLog::from_config(&config)?;
        info!(
            session = %config.session_name,
            dir = %config.log_dir.display(),
            error_bound = config.error_bound,
            "session opened"
        );
        Ok(Self { config, log })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn log(&self) -> &ViolationLog<L> {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut ViolationLog<L> {
        &mut self.log
    }

    pub fn into_log(self) -> ViolationLog<L> {
        self.log
    }

    /// Applies the session's name and toggles to `searcher`.
    pub fn configure<E, M, P>(&self, searcher: &mut DfsSearcher<E, M, P>)
    where
        E: Enabler,
        M: StateManager<State = E::State, Transition = E::Transition>,
        P: StatePredicate<E::State>,
    {
        searcher.set_name(&self.config.session_name);
        searcher.set_debugging(self.config.debug);
        searcher.set_report_cycle_as_violation(self.config.report_cycle_as_violation);
    }

    /// Searches from `initial`, logging every hit until the space is
    /// exhausted or the error bound is reached.
    ///
    /// `classify` maps the state the hit was found at, and the kind of hit,
    /// to a log entry. Entries comparing equal are deduplicated by the log.
    pub fn explore<E, M, P, F>(
        &mut self,
        searcher: &mut DfsSearcher<E, M, P>,
        initial: E::State,
        mut classify: F,
    ) -> Result<SessionReport, SessionError>
    where
        E: Enabler,
        M: StateManager<State = E::State, Transition = E::Transition>,
        P: StatePredicate<E::State>,
        F: FnMut(&E::State, SearchOutcome) -> L,
    {
        self.configure(searcher);
        let reported_before = self.log.num_errors();

        let mut outcome = searcher.search(initial);
        let stop_reason = loop {
            if !outcome.is_hit() {
                break StopReason::Exhausted;
            }
            let Some(state) = searcher.current_state() else {
                break StopReason::Exhausted;
            };
            let entry = classify(state, outcome);
            self.log.report(entry, &*searcher)?;

            if self.log.bound_reached() {
                warn!(
                    session = %self.config.session_name,
                    bound = self.log.error_bound(),
                    "error bound reached, stopping search"
                );
                break StopReason::ErrorBoundReached;
            }

            // A cycle stop leaves the top state where it was, so resuming
            // directly would re-check the predicate there.
            outcome = if searcher.proceed_to_new_state() {
                searcher.resume()
            } else if searcher.cycle_found() {
                SearchOutcome::Cycle
            } else {
                SearchOutcome::Exhausted
            };
        };

        let report = SessionReport {
            session_name: self.config.session_name.clone(),
            stats: searcher.stats(),
            errors_reported: self.log.num_errors() - reported_before,
            distinct_errors: self.log.num_entries(),
            stop_reason,
        };
        info!(
            session = %report.session_name,
            reported = report.errors_reported,
            distinct = report.distinct_errors,
            states = report.stats.states_seen,
            stop = ?report.stop_reason,
            "exploration finished"
        );
        Ok(report)
    }

    pub fn print_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        self.log.print(out)
    }
}
