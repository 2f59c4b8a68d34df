//! Mock implementations for testing

use crate::error::LoadError;
use crate::loader::{LoadedPlugin, PluginLoader};
use crate::plugin::PluginRecord;
use crate::state::{PluginStore, State};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Scriptable loader
///
/// Resolves every call with the configured outcome. The state visible to
/// the loader at the moment it was invoked is kept for inspection. A gated
/// loader waits for [`MockLoader::release`] before answering.
#[derive(Debug, Clone)]
pub struct MockLoader {
    outcome: Result<LoadedPlugin, LoadError>,
    calls: Arc<AtomicUsize>,
    observed: Arc<Mutex<Vec<Arc<State>>>>,
    gate: Option<Arc<Notify>>,
}

impl MockLoader {
    /// Loader resolving with `outcome`
    pub fn new(outcome: Result<LoadedPlugin, LoadError>) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            observed: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Loader resolving with `record`
    pub fn succeeding(record: PluginRecord) -> Self {
        Self::new(Ok(LoadedPlugin::Record(record)))
    }

    /// Loader failing with `message`
    pub fn failing(message: &str) -> Self {
        Self::new(Err(LoadError::msg(message.to_string())))
    }

    /// Hold every answer until [`MockLoader::release`] is called
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one gated call answer
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// This loader as a shared loader
    pub fn loader(&self) -> Arc<dyn PluginLoader> {
        Arc::new(self.clone())
    }

    /// Number of load calls
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// State snapshots taken when each call started
    pub fn observed_states(&self) -> Vec<Arc<State>> {
        self.observed.lock().clone()
    }
}

#[async_trait]
impl PluginLoader for MockLoader {
    async fn load(&self, store: PluginStore) -> Result<LoadedPlugin, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.observed.lock().push(store.state());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcome.clone()
    }
}
