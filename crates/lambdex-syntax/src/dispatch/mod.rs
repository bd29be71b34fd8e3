//! Token dispatch table keyed on token identity and parser state.
//!
//! A [`DispatchTable`] maps `(exact_type, string, last_state)` keys, any slot
//! of which may be a wildcard, to plain function handlers. Each significant
//! token is looked up with a fixed, ranked sequence of four probe keys and the
//! first registered handler wins:
//!
//! 1. exact type, exact string, exact state
//! 2. exact type, any string, exact state
//! 3. any type, any string, exact state
//! 4. exact type, exact string, any state
//!
//! Only [`ExactType::Name`] tokens keep their string in a key. For every other
//! exact type the string slot is dropped, so probes 1 and 2 coincide and probe
//! 4 means "this exact type in any state".

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use thiserror::Error;
use tracing::trace;

use crate::context::ParseContext;
use crate::token::{ExactType, Token};

#[cfg(test)]
mod tests;

const DISPATCH_TARGET: &str = "lambdex_syntax::dispatch";

/// Errors raised while registering dispatch rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// A handler is already registered under the same canonical key.
    #[error("duplicate dispatch rule for key {key}")]
    DuplicateRule {
        /// Rendered canonical key.
        key: String,
    },

    /// A string constraint was combined with a non-name exact type.
    #[error("a string constraint requires the Name exact type, got {exact_type}")]
    StringRequiresName {
        /// Rendered exact type slot of the rejected rule.
        exact_type: String,
    },
}

/// Handler invoked for a matching token.
pub type Handler<S, X, R> = fn(&mut ParseContext<S, X>, &Token<'_>) -> R;

/// Canonical lookup key. `None` slots are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DispatchKey<S> {
    exact_type: Option<ExactType>,
    string: Option<String>,
    last_state: Option<S>,
}

impl<S> DispatchKey<S> {
    /// Builds the canonical key, dropping the string slot unless the exact
    /// type is [`ExactType::Name`].
    fn canonical(exact_type: Option<ExactType>, string: Option<&str>, last_state: Option<S>) -> Self {
        let keeps_string = exact_type.is_some_and(ExactType::is_named);
        Self {
            exact_type,
            string: string.filter(|_| keeps_string).map(str::to_owned),
            last_state,
        }
    }
}

impl<S: fmt::Debug> fmt::Display for DispatchKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exact_type = self
            .exact_type
            .map_or_else(|| "*".to_owned(), |exact| exact.to_string());
        let last_state = self
            .last_state
            .as_ref()
            .map_or_else(|| "*".to_owned(), |state| format!("{state:?}"));
        match &self.string {
            Some(string) => write!(f, "({exact_type}, {string:?}, {last_state})"),
            None => write!(f, "({exact_type}, *, {last_state})"),
        }
    }
}

/// Builder describing the token and state a handler applies to.
///
/// Slots left unset are wildcards.
///
/// ```ignore
/// let key = RuleKey::new()
///     .with_type(ExactType::Name)
///     .with_string("lambda")
///     .in_state(LambdaState::InParamList);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleKey<S> {
    exact_type: Option<ExactType>,
    string: Option<String>,
    last_state: Option<S>,
}

impl<S> Default for RuleKey<S> {
    fn default() -> Self {
        Self {
            exact_type: None,
            string: None,
            last_state: None,
        }
    }
}

impl<S> RuleKey<S> {
    /// Creates a key with every slot set to the wildcard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the rule to one exact token type.
    #[must_use]
    pub fn with_type(mut self, exact_type: ExactType) -> Self {
        self.exact_type = Some(exact_type);
        self
    }

    /// Restricts the rule to one token string. Only valid for names.
    #[must_use]
    pub fn with_string(mut self, string: impl Into<String>) -> Self {
        self.string = Some(string.into());
        self
    }

    /// Restricts the rule to one parser state.
    #[must_use]
    pub fn in_state(mut self, last_state: S) -> Self {
        self.last_state = Some(last_state);
        self
    }
}

/// Registry of token handlers with ranked fallback lookup.
///
/// Handlers are plain function pointers, so a table is `Send + Sync`
/// whenever its state type is, and one table may serve many passes.
pub struct DispatchTable<S, X, R> {
    rules: HashMap<DispatchKey<S>, Handler<S, X, R>>,
}

impl<S, X, R> fmt::Debug for DispatchTable<S, X, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl<S, X, R> Default for DispatchTable<S, X, R> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }
}

impl<S, X, R> DispatchTable<S, X, R>
where
    S: Copy + Eq + Hash + fmt::Debug,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether no rule has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registers `handler` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::StringRequiresName`] if `key` constrains the
    /// string without fixing the exact type to [`ExactType::Name`], and
    /// [`DispatchError::DuplicateRule`] if the canonical key is taken.
    pub fn register(
        &mut self,
        key: RuleKey<S>,
        handler: Handler<S, X, R>,
    ) -> Result<(), DispatchError> {
        let RuleKey {
            exact_type,
            string,
            last_state,
        } = key;

        if string.is_some() && !exact_type.is_some_and(ExactType::is_named) {
            return Err(DispatchError::StringRequiresName {
                exact_type: exact_type.map_or_else(|| "*".to_owned(), |exact| exact.to_string()),
            });
        }

        let canonical = DispatchKey::canonical(exact_type, string.as_deref(), last_state);
        if self.rules.contains_key(&canonical) {
            return Err(DispatchError::DuplicateRule {
                key: canonical.to_string(),
            });
        }

        trace!(target: DISPATCH_TARGET, key = %canonical, "registered dispatch rule");
        self.rules.insert(canonical, handler);
        Ok(())
    }

    /// Dispatches `token` in the state recorded by `ctx`.
    ///
    /// Insignificant tokens always pass through and return `None`, as does a
    /// token for which no probe key has a handler.
    pub fn dispatch(&self, ctx: &mut ParseContext<S, X>, token: &Token<'_>) -> Option<R> {
        if token.is_insignificant() {
            return None;
        }

        let handler = probe_keys(token, ctx.last_state())
            .iter()
            .find_map(|key| self.rules.get(key))
            .copied()?;
        Some(handler(ctx, token))
    }
}

/// Probe keys for `token` in `state`, most specific first.
fn probe_keys<S: Copy>(token: &Token<'_>, state: S) -> [DispatchKey<S>; 4] {
    let exact_type = token.exact_type();
    let string = token.string();
    [
        DispatchKey::canonical(Some(exact_type), Some(string), Some(state)),
        DispatchKey::canonical(Some(exact_type), None, Some(state)),
        DispatchKey::canonical(None, None, Some(state)),
        DispatchKey::canonical(Some(exact_type), Some(string), None),
    ]
}
