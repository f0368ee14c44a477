use std::io::{self, Write};

use gmc_model::{StateManager, StatePredicate};
use tracing::{debug, info};

use super::chooser::{ChooserError, TransitionChooser};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("replay misguided: {0}")]
    Misguided(#[from] ChooserError),

    #[error("replay output error: {0}")]
    Io(#[from] io::Error),

    #[error("no executions to replay")]
    NoExecutions,
}

/// One of the parallel executions driven by a replay.
#[derive(Debug, Clone)]
pub struct Execution<S> {
    /// Shown next to printed states, e.g. "Symbolic" or "Concrete".
    pub name: Option<String>,
    pub state: S,
    /// Whether this execution's states are printed.
    pub print: bool,
}

impl<S> Execution<S> {
    pub fn new(state: S) -> Self {
        Self {
            name: None,
            state,
            print: true,
        }
    }

    pub fn named(name: &str, state: S, print: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            state,
            print,
        }
    }
}

/// A predicate hit observed during a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayViolation {
    /// Index of the execution the violation was seen in.
    pub execution: usize,
    /// Number of transitions executed before the check.
    pub step: usize,
    pub predicate: String,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome<S> {
    /// Transitions executed.
    pub steps: usize,
    pub violations: Vec<ReplayViolation>,
    /// State of each execution when the replay ended.
    pub final_states: Vec<S>,
}

impl<S> ReplayOutcome<S> {
    pub fn violation_found(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Executes a transition system along a path picked by a chooser.
///
/// Several executions can run in lockstep: the first one resolves every
/// choice, and the chosen transition is applied to all of them. The common
/// case replays one guide against a symbolic state and the concrete state
/// obtained from it.
pub struct Replayer<M: StateManager, W> {
    manager: M,
    out: W,
    print_all_states: bool,
    predicate: Option<Box<dyn StatePredicate<M::State>>>,
    step_bound: Option<usize>,
}

impl<M: StateManager, W: Write> Replayer<M, W> {
    pub fn new(manager: M, out: W) -> Self {
        Self {
            manager,
            out,
            print_all_states: true,
            predicate: None,
            step_bound: None,
        }
    }

    /// Print states after every transition. When off, only the initial
    /// states and states where the predicate holds are printed.
    pub fn set_print_all_states(&mut self, value: bool) {
        self.print_all_states = value;
    }

    pub fn print_all_states(&self) -> bool {
        self.print_all_states
    }

    /// Check this predicate at every state of every execution.
    pub fn set_predicate(&mut self, predicate: Box<dyn StatePredicate<M::State>>) {
        self.predicate = Some(predicate);
    }

    pub fn clear_predicate(&mut self) {
        self.predicate = None;
    }

    /// Stop after this many transitions. `None` runs until the chooser
    /// returns no transition or reaches the path length it declares.
    pub fn set_step_bound(&mut self, bound: Option<usize>) {
        self.step_bound = bound;
    }

    pub fn step_bound(&self) -> Option<usize> {
        self.step_bound
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Play all `executions` in lockstep along the chooser's path.
    ///
    /// Violations are reported and recorded but do not stop the replay.
    pub fn play<C>(
        &mut self,
        executions: Vec<Execution<M::State>>,
        chooser: &mut C,
    ) -> Result<ReplayOutcome<M::State>, ReplayError>
    where
        C: TransitionChooser<M::State, M::Transition>,
    {
        if executions.is_empty() {
            return Err(ReplayError::NoExecutions);
        }

        let mut names = Vec::with_capacity(executions.len());
        let mut print = Vec::with_capacity(executions.len());
        let mut states = Vec::with_capacity(executions.len());
        for execution in executions {
            names.push(
                execution
                    .name
                    .map(|name| format!(" ({name})"))
                    .unwrap_or_default(),
            );
            print.push(execution.print);
            states.push(execution.state);
        }

        let bound = match (self.step_bound, chooser.path_length()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let mut step = 0;
        let mut violations = Vec::new();

        writeln!(self.out, "\nInitial state:")?;
        self.print_states(step, &names, &print, &states)?;

        loop {
            if let Some(predicate) = self.predicate.as_mut() {
                for (i, state) in states.iter().enumerate() {
                    if !predicate.holds_at(state) {
                        continue;
                    }
                    let explanation = predicate.explanation();
                    if !self.print_all_states {
                        writeln!(self.out)?;
                        writeln!(self.out, "{}", self.manager.state_details(state))?;
                    }
                    writeln!(self.out)?;
                    writeln!(
                        self.out,
                        "Violation of {} found in {}{}:",
                        predicate,
                        self.manager.state_summary(state),
                        names[i]
                    )?;
                    writeln!(self.out, "{explanation}")?;
                    writeln!(self.out)?;
                    info!(
                        predicate = %predicate,
                        execution = i,
                        step,
                        "violation found during replay"
                    );
                    violations.push(ReplayViolation {
                        execution: i,
                        step,
                        predicate: predicate.to_string(),
                        explanation,
                    });
                }
            }

            // The last recorded transition may be the one that triggers the
            // violation, so the bound is checked only after the predicate.
            if bound.is_some_and(|bound| step >= bound) {
                break;
            }
            let Some(transition) = chooser.choose_enabled_transition(&states[0])? else {
                break;
            };
            step += 1;
            writeln!(
                self.out,
                "\nTransition {}: {}",
                step,
                self.manager.transition_summary(&transition)
            )?;
            debug!(step, transition = %self.manager.transition_summary(&transition), "replay step");
            for state in states.iter_mut() {
                *state = self.manager.next_state(state, &transition);
            }
            if self.print_all_states {
                self.print_states(step, &names, &print, &states)?;
            }
        }

        writeln!(self.out, "Trace ends after {step} transitions.")?;
        self.out.flush()?;

        Ok(ReplayOutcome {
            steps: step,
            violations,
            final_states: states,
        })
    }

    /// Replay a single execution.
    pub fn play_one<C>(
        &mut self,
        initial: M::State,
        chooser: &mut C,
    ) -> Result<ReplayOutcome<M::State>, ReplayError>
    where
        C: TransitionChooser<M::State, M::Transition>,
    {
        self.play(vec![Execution::new(initial)], chooser)
    }

    /// Replay a symbolic execution alongside its concrete counterpart. The
    /// symbolic state resolves the choices.
    pub fn play_symbolic_concrete<C>(
        &mut self,
        symbolic: M::State,
        concrete: M::State,
        print_symbolic: bool,
        chooser: &mut C,
    ) -> Result<ReplayOutcome<M::State>, ReplayError>
    where
        C: TransitionChooser<M::State, M::Transition>,
    {
        self.play(
            vec![
                Execution::named("Symbolic", symbolic, print_symbolic),
                Execution::named("Concrete", concrete, true),
            ],
            chooser,
        )
    }

    fn print_states(
        &mut self,
        step: usize,
        names: &[String],
        print: &[bool],
        states: &[M::State],
    ) -> io::Result<()> {
        for ((name, &show), state) in names.iter().zip(print).zip(states) {
            if show {
                writeln!(self.out)?;
                writeln!(self.out, "State {step}{name}:")?;
                writeln!(self.out, "{}", self.manager.state_details(state))?;
            }
        }
        Ok(())
    }
}
