use gmc_model::{Enabler, TransitionSequence};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::chooser::{ChooserError, TransitionChooser};

/// Pseudo-random transition chooser, seeded for reproducibility.
///
/// Picks uniformly among the enabled transitions at each choice point and
/// records the rank it picked, so a random execution can be saved as a guide
/// and replayed with [`GuidedTransitionChooser`](super::chooser::GuidedTransitionChooser).
pub struct RandomTransitionChooser<E> {
    enabler: E,
    rng: ChaCha8Rng,
    recorded: Vec<usize>,
}

impl<E: Enabler> RandomTransitionChooser<E> {
    pub fn new(enabler: E, rng: ChaCha8Rng) -> Self {
        Self {
            enabler,
            rng,
            recorded: Vec::new(),
        }
    }

    pub fn with_seed(enabler: E, seed: u64) -> Self {
        Self::new(enabler, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Ranks chosen so far, one per choice point.
    pub fn recorded_guide(&self) -> &[usize] {
        &self.recorded
    }
}

impl<E: Enabler> TransitionChooser<E::State, E::Transition> for RandomTransitionChooser<E> {
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

        let mut options = Vec::new();
        while sequence.has_next() {
            options.push(sequence.advance());
        }
        let index = self.rng.gen_range(0..options.len());
        self.recorded.push(index);
        Ok(Some(options.swap_remove(index)))
    }
}
