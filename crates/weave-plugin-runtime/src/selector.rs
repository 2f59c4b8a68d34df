//! Memoized composition of plugin-contributed reducers and middleware

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use weave_core::{compose_middleware, compose_reducers, ComposedMiddleware, ComposedReducer};
use weave_plugin_api::{Action, Dispatched, PluginCollection, State};

/// Effective reducer and middleware of one plugin collection
pub struct Composition {
    version: u64,
    reducer: ComposedReducer<State, Action>,
    middleware: ComposedMiddleware<State, Action, Dispatched>,
}

impl Composition {
    /// Compose the behaviors of `plugins` in insertion order
    ///
    /// Records without a reducer or middleware are skipped. The earliest
    /// registered middleware runs outermost.
    pub fn from_plugins(plugins: &PluginCollection) -> Self {
        Self {
            version: plugins.version(),
            reducer: compose_reducers(plugins.iter().filter_map(|p| p.reducer().cloned())),
            middleware: compose_middleware(plugins.iter().filter_map(|p| p.middleware().cloned())),
        }
    }

    /// Version of the collection this was composed from
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Composed reducer
    pub fn reducer(&self) -> &ComposedReducer<State, Action> {
        &self.reducer
    }

    /// Composed middleware
    pub fn middleware(&self) -> &ComposedMiddleware<State, Action, Dispatched> {
        &self.middleware
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("version", &self.version)
            .field("reducers", &self.reducer.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Single-entry cache from plugin collection to [`Composition`]
///
/// A cached composition is reused as long as the collection version is
/// unchanged and recomputed as soon as it differs.
#[derive(Default)]
pub struct CompositionSelector {
    cached: Mutex<Option<Arc<Composition>>>,
    recomputations: AtomicU64,
}

impl CompositionSelector {
    /// Create an empty selector
    pub fn new() -> Self {
        Self::default()
    }

    /// Composition for `plugins`
    pub fn select(&self, plugins: &PluginCollection) -> Arc<Composition> {
        let mut cached = self.cached.lock();
        if let Some(composition) = cached.as_ref() {
            if composition.version == plugins.version() {
                return Arc::clone(composition);
            }
        }

        let composition = Arc::new(Composition::from_plugins(plugins));
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        debug!(
            version = composition.version,
            reducers = composition.reducer.len(),
            middleware = composition.middleware.len(),
            "Recomposed plugin behaviors"
        );
        *cached = Some(Arc::clone(&composition));
        composition
    }

    /// Number of times a composition was computed
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for CompositionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionSelector")
            .field("recomputations", &self.recomputations())
            .finish()
    }
}
