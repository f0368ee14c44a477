//! State manager contract.
//!
//! The manager computes successors and owns the visited-state bookkeeping.
//! The engine never keeps its own visited set: `seen` and `on_stack` live
//! here so any canonicalization or hashing scheme can back a search.

/// Successor computation plus seen/on-stack flags for a transition system.
pub trait StateManager {
    type State;
    type Transition;

    /// The state reached by executing `transition` from `state`.
    fn next_state(&mut self, state: &Self::State, transition: &Self::Transition) -> Self::State;

    fn seen(&self, state: &Self::State) -> bool;

    fn set_seen(&mut self, state: &Self::State, value: bool);

    fn on_stack(&self, state: &Self::State) -> bool;

    fn set_on_stack(&mut self, state: &Self::State, value: bool);

    /// One-line rendering of a state, used in stack summaries.
    fn state_summary(&self, state: &Self::State) -> String;

    /// Full rendering of a state, used in detailed traces and replays.
    fn state_details(&self, state: &Self::State) -> String {
        self.state_summary(state)
    }

    fn transition_summary(&self, transition: &Self::Transition) -> String;
}

impl<M: StateManager + ?Sized> StateManager for &mut M {
    type State = M::State;
    type Transition = M::Transition;

    fn next_state(&mut self, state: &Self::State, transition: &Self::Transition) -> Self::State {
        (**self).next_state(state, transition)
    }

    fn seen(&self, state: &Self::State) -> bool {
        (**self).seen(state)
    }

    fn set_seen(&mut self, state: &Self::State, value: bool) {
        (**self).set_seen(state, value)
    }

    fn on_stack(&self, state: &Self::State) -> bool {
        (**self).on_stack(state)
    }

    fn set_on_stack(&mut self, state: &Self::State, value: bool) {
        (**self).set_on_stack(state, value)
    }

    fn state_summary(&self, state: &Self::State) -> String {
        (**self).state_summary(state)
    }

    fn state_details(&self, state: &Self::State) -> String {
        (**self).state_details(state)
    }

    fn transition_summary(&self, transition: &Self::Transition) -> String {
        (**self).transition_summary(transition)
    }
}
