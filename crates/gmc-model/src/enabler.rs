//! Enabled-transition contracts.
//!
//! An [`Enabler`] tells the engine which transitions to explore from a
//! state. It hands out a [`TransitionSequence`] cursor per source state; the
//! engine walks that cursor in order, so the order an enabler produces is
//! the order siblings are explored and the order guide indices refer to.

/// A cursor over the transitions enabled at one fixed source state.
///
/// The cursor carries its own position. It is single-writer: never share one
/// cursor between interleaved callers.
pub trait TransitionSequence {
    type State;
    type Transition;

    /// The state these transitions depart from.
    fn source(&self) -> &Self::State;

    /// The transition at the cursor head, without moving the cursor.
    /// `None` once the sequence is exhausted.
    fn peek(&self) -> Option<&Self::Transition>;

    /// Returns the transition at the cursor head and moves past it.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is exhausted. The engine only advances after
    /// checking [`has_next`](Self::has_next), so a panic here means the
    /// implementation broke its own contract.
    fn advance(&mut self) -> Self::Transition;

    /// Whether the source state has more than one enabled transition in
    /// total. Independent of the cursor position.
    fn has_multiple(&self) -> bool;

    /// 0-based rank of the cursor head among all transitions enabled at the
    /// source, i.e. how many times the cursor has been advanced.
    fn position(&self) -> usize;

    fn has_next(&self) -> bool {
        self.peek().is_some()
    }
}

/// Computes the enabled transitions departing from a state.
pub trait Enabler {
    type State;
    type Transition;
    type Sequence: TransitionSequence<State = Self::State, Transition = Self::Transition>;

    /// A fresh cursor positioned at the first enabled transition of `source`.
    fn enabled_transitions(&mut self, source: &Self::State) -> Self::Sequence;
}

impl<E: Enabler + ?Sized> Enabler for &mut E {
    type State = E::State;
    type Transition = E::Transition;
    type Sequence = E::Sequence;

    fn enabled_transitions(&mut self, source: &Self::State) -> Self::Sequence {
        (**self).enabled_transitions(source)
    }
}
