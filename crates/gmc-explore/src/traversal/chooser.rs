use std::path::Path;

use gmc_model::{Enabler, TransitionSequence};

use super::trace::{Guide, GuideError};

/// The guide disagrees with what the model actually enables. The trace is
/// stale or corrupt relative to the current model; never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChooserError {
    #[error(
        "state has fewer enabled transitions than expected: guide value {index} at choice {choice}, \
         only {enabled} enabled"
    )]
    TooFewTransitions {
        choice: usize,
        index: usize,
        enabled: usize,
    },

    #[error("trace file ends before trail is complete ({consumed} choices consumed)")]
    GuideExhausted { consumed: usize },
}

/// Resolves the transition to take from a state during an execution.
///
/// Abstracted behind a trait so a replay can be driven by a recorded guide,
/// by a seeded random walk, or by anything else that picks transitions.
pub trait TransitionChooser<S, T> {
    /// The transition to execute from `state`, or `None` when nothing is
    /// enabled there.
    fn choose_enabled_transition(&mut self, state: &S) -> Result<Option<T>, ChooserError>;

    /// Number of transitions the chosen path is known to have, if any. A
    /// replay stops there even when the state reached still has choices.
    fn path_length(&self) -> Option<usize> {
        None
    }
}

/// Chooses transitions by following a recorded guide.
///
/// Deterministic states (one enabled transition) consume no guide input. At
/// a choice point the next guide value `k` skips `k` enabled transitions on
/// a fresh cursor and takes the one after.
pub struct GuidedTransitionChooser<E> {
    enabler: E,
    guide: Vec<usize>,
    guide_index: usize,
    declared_steps: Option<usize>,
}

impl<E: Enabler> GuidedTransitionChooser<E> {
    pub fn new(enabler: E, guide: Vec<usize>) -> Self {
        Self {
            enabler,
            guide,
            guide_index: 0,
            declared_steps: None,
        }
    }

    /// Keeps the guide's `Steps:` count so the replay ends at the recorded
    /// witness.
    pub fn from_guide(enabler: E, guide: Guide) -> Self {
        let declared_steps = guide.declared_steps();
        Self {
            declared_steps,
            ..Self::new(enabler, guide.into_choices())
        }
    }

    pub fn from_file(enabler: E, path: impl AsRef<Path>) -> Result<Self, GuideError> {
        Ok(Self::from_guide(enabler, Guide::from_file(path)?))
    }

    /// Guide entries used so far.
    pub fn consumed(&self) -> usize {
        self.guide_index
    }

    pub fn remaining(&self) -> usize {
        self.guide.len() - self.guide_index
    }

    pub fn declared_steps(&self) -> Option<usize> {
        self.declared_steps
    }
}

impl<E: Enabler> TransitionChooser<E::State, E::Transition> for GuidedTransitionChooser<E> {
    fn choose_enabled_transition(
        &mut self,
        state: &E::State,
    ) -> Result<Option<E::Transition>, ChooserError> {
        let mut sequence = self.enabler.enabled_transitions(state);

        if !sequence.has_next() {
            return Ok(None);
        }
        if !sequence.has_multiple() {
            return Ok(Some(sequence.advance()));
        }

        let Some(&index) = self.guide.get(self.guide_index) else {
            return Err(ChooserError::GuideExhausted {
                consumed: self.guide_index,
            });
        };
        let choice = self.guide_index;
        self.guide_index += 1;

        for _ in 0..index {
            if !sequence.has_next() {
                break;
            }
            sequence.advance();
        }
        if !sequence.has_next() {
            return Err(ChooserError::TooFewTransitions {
                choice,
                index,
                enabled: sequence.position(),
            });
        }
        Ok(Some(sequence.advance()))
    }

    fn path_length(&self) -> Option<usize> {
        self.declared_steps
    }
}
