use serde::{Deserialize, Serialize};

/// How a search invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// The predicate holds at the current state (top of the stack).
    Violation,
    /// A transition from the top state leads back onto the stack. Only
    /// reported when cycle detection is on.
    Cycle,
    /// Every reachable state was explored without a hit.
    Exhausted,
}

impl SearchOutcome {
    /// True for `Violation` and `Cycle`: the stack holds a witness.
    pub fn is_hit(self) -> bool {
        !matches!(self, SearchOutcome::Exhausted)
    }
}

/// Observational counters kept by the searcher. They never influence
/// control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Distinct states pushed, the initial state included.
    pub states_seen: u64,
    /// Transitions that led to an already-seen state.
    pub states_matched: u64,
    /// Successor computations performed.
    pub transitions: u64,
}
