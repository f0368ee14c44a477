pub mod chooser;
pub mod engine;
pub mod outcome;
pub mod random;
pub mod replay;
pub mod trace;
