//! Application state and the store types built over it

use crate::action::Action;
use crate::collection::PluginCollection;
use crate::dispatch::Dispatched;
use crate::plugin::PluginRecord;
use serde_json::{Map, Value};
use std::sync::Arc;
use weave_core::{Middleware, Reducer, Store};

/// Store facade handed to hooks, loaders and middleware
pub type PluginStore = Store<State, Action, Dispatched>;

/// Reducer a plugin contributes
pub type SharedReducer = Arc<dyn Reducer<State, Action>>;

/// Middleware a plugin contributes
pub type SharedMiddleware = Arc<dyn Middleware<State, Action, Dispatched>>;

/// Root application state
///
/// Holds the plugin collection under `plugins` and the host application's
/// own state as a JSON document under `data`. Both halves are shared, so
/// cloning a `State` never copies records or documents.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    plugins: PluginCollection,
    data: Arc<Value>,
}

impl State {
    /// Empty state: no plugins, an empty data object
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with application data
    pub fn with_data(data: Value) -> Self {
        Self {
            plugins: PluginCollection::new(),
            data: Arc::new(data),
        }
    }

    /// State seeded with plugin records
    #[must_use]
    pub fn with_plugins<I>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = PluginRecord>,
    {
        self.plugins = plugins.into_iter().collect();
        self
    }

    /// Plugin collection
    pub fn plugins(&self) -> &PluginCollection {
        &self.plugins
    }

    /// Record at `key`
    pub fn plugin(&self, key: &str) -> Option<&PluginRecord> {
        self.plugins.get(key)
    }

    /// Replace the plugin collection
    pub fn set_plugins(&mut self, plugins: PluginCollection) {
        self.plugins = plugins;
    }

    /// Application data
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Mutable application data, copied on write when shared
    pub fn data_mut(&mut self) -> &mut Value {
        Arc::make_mut(&mut self.data)
    }

    /// Field of the application data
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Set a field of the application data
    ///
    /// Non-object data is replaced by an object first.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let data = self.data_mut();
        if !data.is_object() {
            *data = Value::Object(Map::new());
        }
        if let Value::Object(fields) = data {
            fields.insert(field.into(), value);
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let state = State::new();
        assert!(state.plugins().is_empty());
        assert_eq!(state.data(), &json!({}));
    }

    #[test]
    fn test_data_is_copy_on_write() {
        let mut state = State::with_data(json!({"count": 1}));
        let snapshot = state.clone();

        state.set("count", json!(2));

        assert_eq!(snapshot.get("count"), Some(&json!(1)));
        assert_eq!(state.get("count"), Some(&json!(2)));
    }

    #[test]
    fn test_seeded_plugins() {
        let state = State::new().with_plugins(vec![PluginRecord::new("a"), PluginRecord::new("b")]);
        assert_eq!(state.plugins().len(), 2);
        assert!(state.plugin("b").is_some());
    }
}
