pub mod enabler;
pub mod graph;
pub mod manager;
pub mod predicate;
pub mod sequence;

pub use enabler::{Enabler, TransitionSequence};
pub use manager::StateManager;
pub use predicate::{FalsePredicate, StatePredicate};
pub use sequence::VecSequence;
