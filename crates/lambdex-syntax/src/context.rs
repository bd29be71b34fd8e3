//! Mutable parser state threaded through token dispatch.

/// State carried across the dispatch calls of one pass.
///
/// `last_state` records what kind of token was just consumed; `aux` holds
/// whatever else the registered handlers need. A context is created fresh for
/// every pass and never shared between passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext<S, X> {
    last_state: S,
    aux: X,
}

impl<S: Copy, X> ParseContext<S, X> {
    /// Creates a context in `initial` state.
    #[must_use]
    pub const fn new(initial: S, aux: X) -> Self {
        Self {
            last_state: initial,
            aux,
        }
    }

    /// Returns the recorded state.
    #[must_use]
    pub const fn last_state(&self) -> S {
        self.last_state
    }

    /// Records a new state.
    pub const fn set_state(&mut self, state: S) {
        self.last_state = state;
    }

    /// Returns the handler-defined fields.
    #[must_use]
    pub const fn aux(&self) -> &X {
        &self.aux
    }

    /// Returns the handler-defined fields mutably.
    pub const fn aux_mut(&mut self) -> &mut X {
        &mut self.aux
    }

    /// Consumes the context, returning the handler-defined fields.
    #[must_use]
    pub fn into_aux(self) -> X {
        self.aux
    }
}
