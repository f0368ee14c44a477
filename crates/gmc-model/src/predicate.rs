use std::fmt;
use std::marker::PhantomData;

/// A property of states: the search target, and the online check during
/// replay.
///
/// The `Display` impl names the predicate in reports.
pub trait StatePredicate<S>: fmt::Display {
    fn holds_at(&mut self, state: &S) -> bool;

    /// Human-readable explanation of why the predicate last held (or not).
    fn explanation(&self) -> String;
}

impl<S, P: StatePredicate<S> + ?Sized> StatePredicate<S> for &mut P {
    fn holds_at(&mut self, state: &S) -> bool {
        (**self).holds_at(state)
    }

    fn explanation(&self) -> String {
        (**self).explanation()
    }
}

impl<S> StatePredicate<S> for Box<dyn StatePredicate<S>> {
    fn holds_at(&mut self, state: &S) -> bool {
        (**self).holds_at(state)
    }

    fn explanation(&self) -> String {
        (**self).explanation()
    }
}

/// The predicate that holds nowhere. Searching for it explores the whole
/// reachable space, which is what cycle-only checks want.
pub struct FalsePredicate<S> {
    _state: PhantomData<fn(&S)>,
}

impl<S> FalsePredicate<S> {
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }
}

impl<S> Default for FalsePredicate<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Display for FalsePredicate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FalsePredicate")
    }
}

impl<S> StatePredicate<S> for FalsePredicate<S> {
    fn holds_at(&mut self, _state: &S) -> bool {
        false
    }

    fn explanation(&self) -> String {
        "The false predicate is always false.".to_string()
    }
}
