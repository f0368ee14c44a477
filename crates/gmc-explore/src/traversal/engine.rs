use std::io::{self, Write};

use gmc_model::{Enabler, StateManager, StatePredicate, TransitionSequence};
use tracing::{debug, trace};

use super::outcome::{SearchOutcome, SearchStats};
use super::trace::TraceSource;

/// Frames shown at the end of a summarized stack dump.
const SUMMARY_CUT_OFF: usize = 5;

/// Depth-first searcher over an abstract transition system.
///
/// Uses an explicit stack of transition cursors (no recursion). The sources
/// of the cursors form the current path from the initial state. The search
/// stops at the first state where the predicate holds, or, with cycle
/// detection on, at the first transition leading back onto the stack.
///
/// Visited-state bookkeeping belongs to the state manager; the searcher only
/// sets and reads its `seen`/`on_stack` flags. Siblings are explored in the
/// exact order the enabler produces them, which is what makes a recorded
/// guide replayable.
pub struct DfsSearcher<E, M, P>
where
    E: Enabler,
{
    enabler: E,
    manager: M,
    predicate: P,
    stack: Vec<E::Sequence>,
    report_cycle_as_violation: bool,
    cycle_found: bool,
    stats: SearchStats,
    debugging: bool,
    name: Option<String>,
}

impl<E, M, P> DfsSearcher<E, M, P>
where
    E: Enabler,
    M: StateManager<State = E::State, Transition = E::Transition>,
    P: StatePredicate<E::State>,
{
    pub fn new(enabler: E, manager: M, predicate: P) -> Self {
        Self {
            enabler,
            manager,
            predicate,
            stack: Vec::new(),
            report_cycle_as_violation: false,
            cycle_found: false,
            stats: SearchStats::default(),
            debugging: false,
            name: None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Emit per-step debug events (pushes, pops, matches, stack dumps).
    pub fn set_debugging(&mut self, value: bool) {
        self.debugging = value;
    }

    pub fn debugging(&self) -> bool {
        self.debugging
    }

    /// When set, a transition back onto the stack ends the search with
    /// [`SearchOutcome::Cycle`]. Off by default.
    pub fn set_report_cycle_as_violation(&mut self, value: bool) {
        self.report_cycle_as_violation = value;
    }

    pub fn report_cycle_as_violation(&self) -> bool {
        self.report_cycle_as_violation
    }

    /// Whether the last step stopped on a cycle.
    pub fn cycle_found(&self) -> bool {
        self.cycle_found
    }

    /// The state at the top of the stack.
    pub fn current_state(&self) -> Option<&E::State> {
        self.stack.last().map(|seq| seq.source())
    }

    pub fn stack(&self) -> &[E::Sequence] {
        &self.stack
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn enabler(&self) -> &E {
        &self.enabler
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut M {
        &mut self.manager
    }

    pub fn predicate(&self) -> &P {
        &self.predicate
    }

    pub fn into_parts(self) -> (E, M, P) {
        (self.enabler, self.manager, self.predicate)
    }

    /// Push `initial` as the current state and search from it.
    pub fn search(&mut self, initial: E::State) -> SearchOutcome {
        let sequence = self.enabler.enabled_transitions(&initial);
        if !self.manager.seen(&initial) {
            self.manager.set_seen(&initial, true);
            self.stats.states_seen += 1;
        }
        self.manager.set_on_stack(&initial, true);
        if self.debugging {
            debug!(
                searcher = self.label(),
                state = %self.manager.state_details(&initial),
                "pushed initial state onto stack"
            );
        }
        self.stack.push(sequence);
        self.resume()
    }

    /// Search from the current stack until the predicate holds at the
    /// current state, a cycle is hit, or the space is exhausted.
    ///
    /// After a hit, call [`proceed_to_new_state`](Self::proceed_to_new_state)
    /// before resuming, or the same hit is reported again.
    pub fn resume(&mut self) -> SearchOutcome {
        loop {
            let holds = match self.stack.last() {
                Some(sequence) => self.predicate.holds_at(sequence.source()),
                None => false,
            };
            if holds {
                debug!(
                    searcher = self.label(),
                    predicate = %self.predicate,
                    depth = self.stack.len(),
                    "predicate holds at current state: terminating search"
                );
                return SearchOutcome::Violation;
            }
            if !self.proceed_to_new_state() {
                if self.cycle_found {
                    debug!(
                        searcher = self.label(),
                        depth = self.stack.len(),
                        "cycle found in state space"
                    );
                    return SearchOutcome::Cycle;
                }
                debug!(
                    searcher = self.label(),
                    predicate = %self.predicate,
                    states_seen = self.stats.states_seen,
                    "search complete: predicate holds at no reachable state"
                );
                return SearchOutcome::Exhausted;
            }
        }
    }

    /// Advance the search until it arrives at a state not seen before.
    ///
    /// The new state is marked seen and on-stack and its cursor pushed;
    /// returns `true`. Returns `false` when the stack empties, or right away
    /// when cycle detection is on and a transition leads back onto the stack.
    ///
    /// If the previous call stopped on a cycle, the cycle-closing transition
    /// is skipped first.
    pub fn proceed_to_new_state(&mut self) -> bool {
        if self.cycle_found {
            self.cycle_found = false;
            if let Some(sequence) = self.stack.last_mut() {
                if sequence.has_next() {
                    sequence.advance();
                    self.stats.states_matched += 1;
                }
            }
        }

        while let Some(sequence) = self.stack.last_mut() {
            while let Some(transition) = sequence.peek() {
                let new_state = self.manager.next_state(sequence.source(), transition);
                self.stats.transitions += 1;

                if !self.manager.seen(&new_state) {
                    debug_assert!(
                        !self.manager.on_stack(&new_state),
                        "unseen state flagged on-stack"
                    );
                    let next_sequence = self.enabler.enabled_transitions(&new_state);
                    self.manager.set_seen(&new_state, true);
                    self.manager.set_on_stack(&new_state, true);
                    self.stats.states_seen += 1;
                    if self.debugging {
                        debug!(
                            searcher = self.name.as_deref().unwrap_or(""),
                            state = %self.manager.state_summary(&new_state),
                            depth = self.stack.len() + 1,
                            "pushed new state"
                        );
                    }
                    self.stack.push(next_sequence);
                    self.debug_stack("pushed");
                    return true;
                }
                if self.debugging {
                    trace!(
                        state = %self.manager.state_summary(&new_state),
                        "state seen before, moving to next transition"
                    );
                }
                if self.report_cycle_as_violation && self.manager.on_stack(&new_state) {
                    self.cycle_found = true;
                    return false;
                }
                self.stats.states_matched += 1;
                sequence.advance();
            }

            if let Some(finished) = self.stack.pop() {
                self.manager.set_on_stack(finished.source(), false);
            }
            if let Some(top) = self.stack.last_mut() {
                top.advance();
            }
            self.debug_stack("popped");
        }
        false
    }

    /// Dump the stack, one `Step n:` line per frame.
    ///
    /// `long_format` adds full state renderings; `summarize` elides the
    /// middle of deep stacks, keeping the first frames and the last few.
    pub fn print_stack(
        &self,
        out: &mut dyn Write,
        long_format: bool,
        summarize: bool,
    ) -> io::Result<()> {
        let size = self.stack.len();

        if size == 0 {
            writeln!(out, "  <EMPTY>")?;
        }
        for (i, sequence) in self.stack.iter().enumerate() {
            let state = sequence.source();
            let remaining = size - i;

            if !summarize || i <= 1 || remaining < SUMMARY_CUT_OFF - 1 {
                if i > 0 {
                    writeln!(out, " -> {}", self.manager.state_summary(state))?;
                }
                if long_format {
                    writeln!(out)?;
                    writeln!(out, "{}", self.manager.state_details(state))?;
                    writeln!(out)?;
                }
            }
            if summarize && remaining == SUMMARY_CUT_OFF - 1 {
                for _ in 0..3 {
                    writeln!(out, "     .")?;
                }
            }
            if !summarize || i == 0 || remaining < SUMMARY_CUT_OFF {
                write!(out, "Step {}: {}", i + 1, self.manager.state_summary(state))?;
                if let Some(transition) = sequence.peek() {
                    write!(out, " --{}", self.manager.transition_summary(transition))?;
                }
            }
        }
        writeln!(out)?;
        out.flush()
    }

    /// Trace summary followed by trace details.
    pub fn print_trace(&self, out: &mut dyn Write) -> io::Result<()> {
        let prefix = self.name.as_ref().map(|n| format!("{n} ")).unwrap_or_default();
        writeln!(out, "{prefix}Trace summary:\n")?;
        self.print_stack(out, false, false)?;
        writeln!(out)?;
        writeln!(out, "{prefix}Trace details:")?;
        self.print_stack(out, true, false)
    }

    pub fn print_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Number of states seen:    {}", self.stats.states_seen)?;
        writeln!(out, "Number of transitions:    {}", self.stats.transitions)?;
        writeln!(out, "Number of states matched: {}\n", self.stats.states_matched)?;
        out.flush()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    fn debug_stack(&self, event: &str) {
        if !self.debugging {
            return;
        }
        let mut buf = Vec::new();
        if self.print_stack(&mut buf, false, true).is_ok() {
            trace!(
                searcher = self.label(),
                change = event,
                stack = %String::from_utf8_lossy(&buf),
                "stack changed"
            );
        }
    }

    /// Frames whose cursor head is part of the recorded path: all but the
    /// top, plus the top when it closed a cycle.
    fn recorded_frames(&self) -> &[E::Sequence] {
        let count = if self.cycle_found {
            self.stack.len()
        } else {
            self.stack.len().saturating_sub(1)
        };
        &self.stack[..count]
    }
}

impl<E, M, P> TraceSource for DfsSearcher<E, M, P>
where
    E: Enabler,
    M: StateManager<State = E::State, Transition = E::Transition>,
    P: StatePredicate<E::State>,
{
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn steps(&self) -> usize {
        self.recorded_frames().len()
    }

    fn guide(&self) -> Vec<usize> {
        self.recorded_frames()
            .iter()
            .filter(|sequence| sequence.has_multiple())
            .map(|sequence| sequence.position())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmc_model::graph::{ExplicitGraph, GraphEnabler, GraphStateManager, NodePredicate};
    use gmc_model::FalsePredicate;

    /// A -> B, A -> C, B -> A
    fn build_abc() -> ExplicitGraph {
        let mut g = ExplicitGraph::new();
        let a = g.add_node("A");
        let b = g.add_node("B");
        let c = g.add_node("C");
        g.add_edge(a, b, "a->b");
        g.add_edge(a, c, "a->c");
        g.add_edge(b, a, "b->a");
        g
    }

    #[test]
    fn test_finds_c_after_backtracking_through_b() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            NodePredicate::new("reach-C", [2]),
        );

        let outcome = searcher.search(0);
        assert_eq!(outcome, SearchOutcome::Violation);
        assert_eq!(searcher.current_state(), Some(&2));
        assert_eq!(searcher.depth(), 2);
        assert_eq!(searcher.guide(), vec![1]);
        assert_eq!(searcher.steps(), 1);
        // B was popped, so only A and C remain on the stack.
        assert_eq!(searcher.manager().stack_nodes(), vec![0, 2]);
        assert!(searcher.manager().seen(&1));
    }

    #[test]
    fn test_counters() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            NodePredicate::new("reach-C", [2]),
        );
        searcher.search(0);
        let stats = searcher.stats();
        assert_eq!(stats.states_seen, 3);
        assert_eq!(stats.transitions, 3);
        assert_eq!(stats.states_matched, 1);
    }

    #[test]
    fn test_cycle_detection_stops_on_back_edge() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            FalsePredicate::new(),
        );
        searcher.set_report_cycle_as_violation(true);

        let outcome = searcher.search(0);
        assert_eq!(outcome, SearchOutcome::Cycle);
        assert!(searcher.cycle_found());
        assert_eq!(searcher.current_state(), Some(&1));
        // A's choice (rank 0) is recorded; B has a single transition.
        assert_eq!(searcher.guide(), vec![0]);
        assert_eq!(searcher.steps(), 2);
    }

    #[test]
    fn test_exhausts_without_target() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            FalsePredicate::new(),
        );
        assert_eq!(searcher.search(0), SearchOutcome::Exhausted);
        assert!(searcher.stack().is_empty());
        assert_eq!(searcher.manager().seen_count(), 3);
        assert!(searcher.manager().stack_nodes().is_empty());
    }

    #[test]
    fn test_repeated_search_does_not_recount_initial_state() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            FalsePredicate::new(),
        );
        assert_eq!(searcher.search(0), SearchOutcome::Exhausted);
        assert_eq!(searcher.stats().states_seen, 3);

        assert_eq!(searcher.search(0), SearchOutcome::Exhausted);
        assert_eq!(searcher.stats().states_seen, 3);
        assert!(searcher.manager().stack_nodes().is_empty());
    }

    #[test]
    fn test_print_stack_lists_frames() {
        let g = build_abc();
        let mut searcher = DfsSearcher::new(
            GraphEnabler::new(&g),
            GraphStateManager::new(&g),
            NodePredicate::new("reach-C", [2]),
        );
        searcher.search(0);
        let mut buf = Vec::new();
        searcher.print_stack(&mut buf, false, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Step 1: A --a->c -> C\nStep 2: C\n");
    }
}
