//! Plugin manager for high-level plugin operations

use crate::config::RuntimeConfig;
use crate::coordinator::LoadCoordinator;
use crate::error::{PluginRuntimeError, Result};
use crate::reducer::LifecycleReducer;
use std::sync::Arc;
use tracing::info;
use weave_core::{compose_reducers, Store};
use weave_plugin_api::{
    Action, Dispatched, LoadStatus, PluginInfo, PluginRecord, PluginStore, SharedMiddleware,
    SharedReducer, State, StatusUpdate,
};

/// Plugin manager for high-level plugin operations
///
/// Owns a store wired with the lifecycle reducer and the load coordinator,
/// and provides convenience methods over the action vocabulary.
#[derive(Clone, Debug)]
pub struct PluginManager {
    store: PluginStore,
}

impl PluginManager {
    /// Create a new plugin manager with the default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a plugin manager from configuration
    pub fn from_config(config: RuntimeConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    /// Start building a plugin manager
    pub fn builder() -> PluginManagerBuilder {
        PluginManagerBuilder::new()
    }

    /// Get the underlying store
    pub fn store(&self) -> &PluginStore {
        &self.store
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<State> {
        self.store.state()
    }

    /// Dispatch any action
    pub fn dispatch(&self, action: Action) -> Dispatched {
        self.store.dispatch(action)
    }

    /// Register a plugin unless its key is taken
    pub fn add(&self, plugin: PluginRecord) {
        self.store.dispatch(Action::add(plugin));
    }

    /// Overwrite an existing plugin
    pub fn replace(&self, plugin: PluginRecord) {
        self.store.dispatch(Action::replace(plugin));
    }

    /// Merge a full definition and mark it loaded
    pub fn install(&self, plugin: PluginRecord) {
        self.store.dispatch(Action::install(plugin));
    }

    /// Update load status and error of a plugin
    pub fn set_status(&self, key: impl Into<String>, update: StatusUpdate) {
        self.store.dispatch(Action::set_status(key, update));
    }

    /// Load a plugin and wait for the outcome
    pub async fn load(&self, key: impl Into<String>) -> Result<PluginRecord> {
        let key = key.into();
        info!(plugin = %key, "Loading plugin");
        match self.store.dispatch(Action::load(key.clone())).into_load() {
            Some(handle) => Ok(handle.await?),
            None => Err(PluginRuntimeError::LoadIntercepted(key)),
        }
    }

    /// Get plugin by key
    pub fn get(&self, key: &str) -> Option<PluginRecord> {
        self.store.state().plugin(key).cloned()
    }

    /// Check if a plugin exists
    pub fn exists(&self, key: &str) -> bool {
        self.store.state().plugins().contains_key(key)
    }

    /// Get plugin count
    pub fn count(&self) -> usize {
        self.store.state().plugins().len()
    }

    /// List all plugins in registration order
    pub fn list(&self) -> Vec<PluginInfo> {
        self.store.state().plugins().iter().map(PluginRecord::info).collect()
    }

    /// Get plugin statistics
    pub fn stats(&self) -> PluginStats {
        let state = self.store.state();
        let plugins = state.plugins();
        let with_status = |status: LoadStatus| {
            plugins
                .iter()
                .filter(|p| p.load_status() == status)
                .count()
        };

        PluginStats {
            total: plugins.len(),
            not_loaded: with_status(LoadStatus::NotLoaded),
            loading: with_status(LoadStatus::Loading),
            loaded: with_status(LoadStatus::Loaded),
            failed: plugins.iter().filter(|p| p.load_error().is_some()).count(),
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Plugin manager builder
///
/// Host reducers run after the lifecycle reducer on every action. Host
/// middleware wraps the load coordinator, the first one added outermost.
pub struct PluginManagerBuilder {
    config: RuntimeConfig,
    initial_state: State,
    reducers: Vec<SharedReducer>,
    middleware: Vec<SharedMiddleware>,
}

impl PluginManagerBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            initial_state: State::new(),
            reducers: Vec::new(),
            middleware: Vec::new(),
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial state
    #[must_use]
    pub fn with_initial_state(mut self, state: State) -> Self {
        self.initial_state = state;
        self
    }

    /// Add a host reducer
    #[must_use]
    pub fn with_reducer(mut self, reducer: SharedReducer) -> Self {
        self.reducers.push(reducer);
        self
    }

    /// Add host middleware
    #[must_use]
    pub fn with_middleware(mut self, middleware: SharedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Build the manager
    pub fn build(self) -> PluginManager {
        let lifecycle: SharedReducer = Arc::new(
            LifecycleReducer::new().with_rejection_logging(self.config.log_rejections),
        );
        let root: SharedReducer = if self.reducers.is_empty() {
            lifecycle
        } else {
            Arc::new(compose_reducers(
                std::iter::once(lifecycle).chain(self.reducers),
            ))
        };

        let coordinator: SharedMiddleware = Arc::new(LoadCoordinator::new(&self.config.load));
        let store = self
            .middleware
            .into_iter()
            .chain(std::iter::once(coordinator))
            .fold(Store::builder(root, self.initial_state), |builder, m| {
                builder.with_middleware(m)
            })
            .build();

        PluginManager { store }
    }
}

impl Default for PluginManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManagerBuilder")
            .field("config", &self.config)
            .field("reducers", &self.reducers.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Plugin statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PluginStats {
    /// Total number of plugins
    pub total: usize,

    /// Number of registered but not loaded plugins
    pub not_loaded: usize,

    /// Number of plugins with a load in flight
    pub loading: usize,

    /// Number of loaded plugins
    pub loaded: usize,

    /// Number of plugins whose last load failed
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weave_plugin_api::{loader_fn, LoadError, LoadedPlugin};

    #[tokio::test]
    async fn test_plugin_manager() {
        let manager = PluginManager::new();

        manager.add(PluginRecord::new("test").with_data("name", json!("Test")));

        assert!(manager.exists("test"));
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.get("test").unwrap().load_status(), LoadStatus::NotLoaded);
    }

    #[tokio::test]
    async fn test_plugin_stats() {
        let manager = PluginManager::new();

        manager.add(PluginRecord::new("a").with_loader(loader_fn(|_store| async {
            Ok::<_, LoadError>(LoadedPlugin::from(PluginRecord::new("ignored")))
        })));
        manager.add(PluginRecord::new("b"));
        manager.set_status("b", StatusUpdate::failed(LoadError::msg("offline")));

        manager.load("a").await.unwrap();

        let stats = manager.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.not_loaded, 1);
        assert_eq!(stats.loading, 0);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_list_in_registration_order() {
        let manager = PluginManager::new();
        for key in ["c", "a", "b"] {
            manager.add(PluginRecord::new(key));
        }
        manager.install(PluginRecord::new("a"));

        let keys: Vec<_> = manager.list().into_iter().map(|info| info.key).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_builder_wires_host_middleware_outside_coordinator() {
        let manager = PluginManager::builder()
            .with_middleware(weave_core::middleware_fn(
                |_store: &PluginStore, action: Action, next| next.run(action),
            ))
            .build();

        assert_eq!(manager.store().middleware_count(), 2);
    }
}
