//! Minimal state container

use crate::middleware::{Middleware, Next};
use crate::reducer::Reducer;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

struct Inner<S, A, R> {
    state: ArcSwap<S>,
    reducer: Arc<dyn Reducer<S, A>>,
    middleware: Arc<[Arc<dyn Middleware<S, A, R>>]>,
    /// Serializes reducer commits; readers never take it
    commit: Mutex<()>,
}

/// State container with synchronous dispatch
///
/// `Store` is a cheap, clonable handle. It is what middleware, plugin hooks
/// and loaders receive as their view of the application: `dispatch` to send
/// actions, `state` to read the latest snapshot.
///
/// No lock is held while middleware runs, so middleware may dispatch
/// further actions re-entrantly. Reducers run under the commit lock and must
/// not dispatch.
pub struct Store<S, A, R> {
    inner: Arc<Inner<S, A, R>>,
}

impl<S, A, R> Store<S, A, R>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
    R: From<A> + 'static,
{
    /// Start building a store around `reducer`
    pub fn builder(reducer: Arc<dyn Reducer<S, A>>, initial_state: S) -> StoreBuilder<S, A, R> {
        StoreBuilder::new(reducer, initial_state)
    }

    /// Dispatch an action through the middleware chain
    ///
    /// Returns whatever the outermost middleware returns; once the action
    /// reaches the reducer the action itself is converted into `R`.
    pub fn dispatch(&self, action: A) -> R {
        let terminal = |action: A| self.commit(action);
        Next::new(self, &self.inner.middleware, &terminal).run(action)
    }

    fn commit(&self, action: A) -> R {
        {
            let _guard = self.inner.commit.lock();
            let current = self.inner.state.load_full();
            let next = self.inner.reducer.reduce(S::clone(&current), &action);
            self.inner.state.store(Arc::new(next));
        }
        trace!("Action committed");
        R::from(action)
    }
}

impl<S, A, R> Store<S, A, R> {
    /// Current state snapshot
    pub fn state(&self) -> Arc<S> {
        self.inner.state.load_full()
    }

    /// Number of installed middleware
    pub fn middleware_count(&self) -> usize {
        self.inner.middleware.len()
    }

    /// Whether two handles refer to the same store
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S, A, R> Clone for Store<S, A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, R> fmt::Debug for Store<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &std::any::type_name::<S>())
            .field("middleware", &self.inner.middleware.len())
            .finish()
    }
}

/// Store builder
///
/// Middleware is applied in insertion order: the first one added is the
/// outermost and sees every action first.
pub struct StoreBuilder<S, A, R> {
    reducer: Arc<dyn Reducer<S, A>>,
    initial_state: S,
    middleware: Vec<Arc<dyn Middleware<S, A, R>>>,
}

impl<S, A, R> StoreBuilder<S, A, R> {
    /// Create a new store builder
    #[must_use]
    pub fn new(reducer: Arc<dyn Reducer<S, A>>, initial_state: S) -> Self {
        Self {
            reducer,
            initial_state,
            middleware: Vec::new(),
        }
    }

    /// Append middleware to the chain
    #[must_use]
    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware<S, A, R>>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Build the store
    pub fn build(self) -> Store<S, A, R> {
        Store {
            inner: Arc::new(Inner {
                state: ArcSwap::from_pointee(self.initial_state),
                reducer: self.reducer,
                middleware: self.middleware.into(),
                commit: Mutex::new(()),
            }),
        }
    }
}

impl<S, A, R> fmt::Debug for StoreBuilder<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
