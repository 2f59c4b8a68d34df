//! Reducer trait and composition utilities

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Exposes the string kind an action is routed by
///
/// Type-keyed reducers ([`ReducerMap`]) use this to decide whether they
/// handle an action at all.
pub trait ActionKind {
    /// Action kind, e.g. `"ADD_PLUGIN"`
    fn kind(&self) -> &str;
}

/// Pure state transition function
///
/// A reducer takes ownership of the current state and returns the next one.
/// State types are expected to be cheap to clone (persistent or `Arc`-backed),
/// so returning the input unchanged is the no-op path.
pub trait Reducer<S, A>: Send + Sync {
    /// Apply `action` to `state`
    fn reduce(&self, state: S, action: &A) -> S;

    /// Whether this reducer reacts to `action`
    ///
    /// Composed reducers skip members that return `false` here.
    fn handles(&self, _action: &A) -> bool {
        true
    }
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(S, &A) -> S + Send + Sync,
{
    fn reduce(&self, state: S, action: &A) -> S {
        self(state, action)
    }
}

/// Wrap a closure as a shared reducer
pub fn reducer_fn<S, A, F>(f: F) -> Arc<dyn Reducer<S, A>>
where
    F: Fn(S, &A) -> S + Send + Sync + 'static,
    S: 'static,
    A: 'static,
{
    Arc::new(f)
}

type Handler<S, A> = Arc<dyn Fn(S, &A) -> S + Send + Sync>;

/// Reducer that dispatches on [`ActionKind::kind`]
///
/// Only the registered kinds are handled; every other action leaves the
/// state untouched and reports `handles() == false`.
pub struct ReducerMap<S, A> {
    handlers: HashMap<String, Handler<S, A>>,
}

impl<S, A> ReducerMap<S, A> {
    /// Create an empty reducer map
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for an action kind
    ///
    /// A later registration for the same kind replaces the earlier one.
    #[must_use]
    pub fn on<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(S, &A) -> S + Send + Sync + 'static,
    {
        self.handlers.insert(kind.into(), Arc::new(handler));
        self
    }

    /// Registered action kinds
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl<S, A> Default for ReducerMap<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> fmt::Debug for ReducerMap<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerMap")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S, A> Reducer<S, A> for ReducerMap<S, A>
where
    A: ActionKind,
{
    fn reduce(&self, state: S, action: &A) -> S {
        match self.handlers.get(action.kind()) {
            Some(handler) => handler(state, action),
            None => state,
        }
    }

    fn handles(&self, action: &A) -> bool {
        self.handlers.contains_key(action.kind())
    }
}

/// Reducers applied in sequence to the same action
///
/// Each member observes the state produced by the previous one. Members
/// that do not handle the action are skipped.
pub struct ComposedReducer<S, A> {
    reducers: Arc<[Arc<dyn Reducer<S, A>>]>,
}

impl<S, A> ComposedReducer<S, A> {
    /// Identity reducer
    pub fn empty() -> Self {
        Self {
            reducers: Arc::from(Vec::new()),
        }
    }

    /// Number of composed reducers
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether this is the identity reducer
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A> Clone for ComposedReducer<S, A> {
    fn clone(&self) -> Self {
        Self {
            reducers: Arc::clone(&self.reducers),
        }
    }
}

impl<S, A> fmt::Debug for ComposedReducer<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}

impl<S, A> Reducer<S, A> for ComposedReducer<S, A> {
    fn reduce(&self, state: S, action: &A) -> S {
        self.reducers
            .iter()
            .filter(|reducer| reducer.handles(action))
            .fold(state, |state, reducer| reducer.reduce(state, action))
    }

    fn handles(&self, action: &A) -> bool {
        self.reducers.iter().any(|reducer| reducer.handles(action))
    }
}

/// Compose reducers left to right
pub fn compose_reducers<S, A, I>(reducers: I) -> ComposedReducer<S, A>
where
    I: IntoIterator<Item = Arc<dyn Reducer<S, A>>>,
{
    ComposedReducer {
        reducers: reducers.into_iter().collect(),
    }
}
