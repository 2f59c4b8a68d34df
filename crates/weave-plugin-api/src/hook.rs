//! Added-notification hook

use crate::state::PluginStore;

/// Callback run once, synchronously, right after a plugin enters the registry
pub trait PluginWasAdded: Send + Sync {
    /// Called with the store the plugin was added to
    fn plugin_was_added(&self, store: &PluginStore);
}

impl<F> PluginWasAdded for F
where
    F: Fn(&PluginStore) + Send + Sync,
{
    fn plugin_was_added(&self, store: &PluginStore) {
        self(store)
    }
}
