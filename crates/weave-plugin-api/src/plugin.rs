//! Plugin record and load status types

use crate::error::{LoadError, PluginError};
use crate::hook::PluginWasAdded;
use crate::loader::PluginLoader;
use crate::merge::merge_deep;
use crate::state::{SharedMiddleware, SharedReducer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Plugin load status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    /// Registered, full definition not loaded yet
    #[default]
    NotLoaded,

    /// A load is in flight
    Loading,

    /// Full definition installed
    Loaded,
}

impl LoadStatus {
    /// Check if the plugin is loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }

    /// Check if the plugin is loading
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::NotLoaded => "NOT_LOADED",
            LoadStatus::Loading => "LOADING",
            LoadStatus::Loaded => "LOADED",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoadStatus {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_LOADED" => Ok(LoadStatus::NotLoaded),
            "LOADING" => Ok(LoadStatus::Loading),
            "LOADED" => Ok(LoadStatus::Loaded),
            other => Err(PluginError::invalid_status(other)),
        }
    }
}

/// One plugin's identity, load status and contributed behavior
///
/// Records are values: every lifecycle transition produces a new record
/// rather than mutating a shared one. Behaviors (`loader`, `reducer`,
/// `middleware`, `on_added`) are shared behind `Arc`s, so cloning is cheap
/// apart from the JSON `data` fields.
#[derive(Clone, Default)]
pub struct PluginRecord {
    key: String,
    load_status: Option<LoadStatus>,
    load_error: Option<LoadError>,
    loader: Option<Arc<dyn PluginLoader>>,
    reducer: Option<SharedReducer>,
    middleware: Option<SharedMiddleware>,
    on_added: Option<Arc<dyn PluginWasAdded>>,
    data: Map<String, Value>,
}

impl PluginRecord {
    /// Create a record with the given key and nothing else
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Build a record from a JSON manifest
    ///
    /// The manifest must be an object. `key`, `loadStatus` and `loadError`
    /// are lifted into the record; every other field becomes data.
    pub fn from_manifest(manifest: Value) -> Result<Self, PluginError> {
        let Value::Object(mut fields) = manifest else {
            return Err(PluginError::invalid(format!(
                "expected a JSON object, got {}",
                json_kind(&manifest)
            )));
        };

        let key = match fields.remove("key") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(key)) => key,
            Some(other) => {
                return Err(PluginError::invalid(format!(
                    "key must be a string, got {}",
                    json_kind(&other)
                )))
            }
        };

        let load_status = match fields.remove("loadStatus") {
            None | Some(Value::Null) => None,
            Some(Value::String(status)) => Some(status.parse()?),
            Some(other) => {
                return Err(PluginError::invalid(format!(
                    "loadStatus must be a string, got {}",
                    json_kind(&other)
                )))
            }
        };

        let load_error = match fields.remove("loadError") {
            None | Some(Value::Null) => None,
            Some(Value::String(message)) => Some(LoadError::msg(message)),
            Some(other) => Some(LoadError::msg(other.to_string())),
        };

        Ok(Self {
            key,
            load_status,
            load_error,
            data: fields,
            ..Self::default()
        })
    }

    /// Set a data field
    #[must_use]
    pub fn with_data(mut self, field: impl Into<String>, value: Value) -> Self {
        self.data.insert(field.into(), value);
        self
    }

    /// Set the declared load status
    #[must_use]
    pub fn with_status(mut self, status: LoadStatus) -> Self {
        self.load_status = Some(status);
        self
    }

    /// Set the load error
    #[must_use]
    pub fn with_error(mut self, error: LoadError) -> Self {
        self.load_error = Some(error);
        self
    }

    /// Set the loader
    #[must_use]
    pub fn with_loader(mut self, loader: Arc<dyn PluginLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the contributed reducer
    #[must_use]
    pub fn with_reducer(mut self, reducer: SharedReducer) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// Set the contributed middleware
    #[must_use]
    pub fn with_middleware(mut self, middleware: SharedMiddleware) -> Self {
        self.middleware = Some(middleware);
        self
    }

    /// Set the hook invoked once the record enters the registry
    #[must_use]
    pub fn on_added(mut self, hook: Arc<dyn PluginWasAdded>) -> Self {
        self.on_added = Some(hook);
        self
    }

    /// The same record under another key
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Record with `NOT_LOADED` status unless one is declared
    #[must_use]
    pub fn with_default_status(mut self) -> Self {
        self.load_status.get_or_insert(LoadStatus::NotLoaded);
        self
    }

    /// Unique key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the key is usable for lifecycle actions
    pub fn has_valid_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Load status, `NOT_LOADED` when none is declared
    pub fn load_status(&self) -> LoadStatus {
        self.load_status.unwrap_or_default()
    }

    /// Load status exactly as declared on the record
    pub fn declared_status(&self) -> Option<LoadStatus> {
        self.load_status
    }

    /// Error from the last failed load attempt
    pub fn load_error(&self) -> Option<&LoadError> {
        self.load_error.as_ref()
    }

    /// Loader, if the plugin can be loaded
    pub fn loader(&self) -> Option<&Arc<dyn PluginLoader>> {
        self.loader.as_ref()
    }

    /// Contributed reducer
    pub fn reducer(&self) -> Option<&SharedReducer> {
        self.reducer.as_ref()
    }

    /// Contributed middleware
    pub fn middleware(&self) -> Option<&SharedMiddleware> {
        self.middleware.as_ref()
    }

    /// Added-notification hook
    pub fn added_hook(&self) -> Option<&Arc<dyn PluginWasAdded>> {
        self.on_added.as_ref()
    }

    /// All data fields
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// A single data field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Overwrite the load status
    pub fn set_load_status(&mut self, status: LoadStatus) {
        self.load_status = Some(status);
    }

    /// Overwrite the load error
    pub fn set_load_error(&mut self, error: LoadError) {
        self.load_error = Some(error);
    }

    /// Remove the load error
    pub fn clear_load_error(&mut self) {
        self.load_error = None;
    }

    /// Merge `overlay` over this record
    ///
    /// Every field the overlay sets wins. Data objects are merged
    /// recursively; any other data value is replaced.
    #[must_use]
    pub fn merge_deep(mut self, overlay: PluginRecord) -> Self {
        let PluginRecord {
            key,
            load_status,
            load_error,
            loader,
            reducer,
            middleware,
            on_added,
            data,
        } = overlay;

        if !key.is_empty() {
            self.key = key;
        }
        self.load_status = load_status.or(self.load_status);
        self.load_error = load_error.or(self.load_error);
        self.loader = loader.or(self.loader);
        self.reducer = reducer.or(self.reducer);
        self.middleware = middleware.or(self.middleware);
        self.on_added = on_added.or(self.on_added);
        for (field, value) in data {
            match self.data.get_mut(&field) {
                Some(existing) => merge_deep(existing, value),
                None => {
                    self.data.insert(field, value);
                }
            }
        }
        self
    }

    /// Serializable summary
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            key: self.key.clone(),
            load_status: self.load_status(),
            load_error: self.load_error.as_ref().map(ToString::to_string),
            loadable: self.loader.is_some(),
            has_reducer: self.reducer.is_some(),
            has_middleware: self.middleware.is_some(),
            data: self.data.clone(),
        }
    }
}

fn opt_ptr_eq<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for PluginRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.load_status == other.load_status
            && self.load_error == other.load_error
            && self.data == other.data
            && opt_ptr_eq(&self.loader, &other.loader)
            && opt_ptr_eq(&self.reducer, &other.reducer)
            && opt_ptr_eq(&self.middleware, &other.middleware)
            && opt_ptr_eq(&self.on_added, &other.on_added)
    }
}

impl fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRecord")
            .field("key", &self.key)
            .field("load_status", &self.load_status)
            .field("load_error", &self.load_error)
            .field("loader", &self.loader.is_some())
            .field("reducer", &self.reducer.is_some())
            .field("middleware", &self.middleware.is_some())
            .field("on_added", &self.on_added.is_some())
            .field("data", &self.data)
            .finish()
    }
}

impl TryFrom<Value> for PluginRecord {
    type Error = PluginError;

    fn try_from(manifest: Value) -> Result<Self, Self::Error> {
        Self::from_manifest(manifest)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Plugin information (serializable summary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    /// Plugin key
    pub key: String,

    /// Load status
    pub load_status: LoadStatus,

    /// Message of the last load error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,

    /// Whether the record carries a loader
    pub loadable: bool,

    /// Whether the record contributes a reducer
    pub has_reducer: bool,

    /// Whether the record contributes middleware
    pub has_middleware: bool,

    /// Data fields
    pub data: Map<String, Value>,
}
