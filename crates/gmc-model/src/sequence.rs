use crate::enabler::TransitionSequence;

/// A cursor over a precomputed list of transitions.
///
/// Most enablers can compute the full enabled set up front; this is the
/// stock cursor for them.
#[derive(Debug, Clone)]
pub struct VecSequence<S, T> {
    source: S,
    transitions: Vec<T>,
    position: usize,
}

impl<S, T> VecSequence<S, T> {
    pub fn new(source: S, transitions: Vec<T>) -> Self {
        Self {
            source,
            transitions,
            position: 0,
        }
    }

    /// All transitions enabled at the source, including ones already passed.
    pub fn transitions(&self) -> &[T] {
        &self.transitions
    }

    /// Transitions from the cursor head onwards.
    pub fn remaining(&self) -> &[T] {
        &self.transitions[self.position..]
    }
}

impl<S, T: Clone> TransitionSequence for VecSequence<S, T> {
    type State = S;
    type Transition = T;

    fn source(&self) -> &S {
        &self.source
    }

    fn peek(&self) -> Option<&T> {
        self.transitions.get(self.position)
    }

    fn advance(&mut self) -> T {
        let transition = match self.transitions.get(self.position) {
            Some(t) => t.clone(),
            None => panic!(
                "advanced an exhausted transition sequence ({} transitions)",
                self.transitions.len()
            ),
        };
        self.position += 1;
        transition
    }

    fn has_multiple(&self) -> bool {
        self.transitions.len() > 1
    }

    fn position(&self) -> usize {
        self.position
    }
}
