//! Action vocabulary

use crate::error::LoadError;
use crate::plugin::{LoadStatus, PluginRecord};
use serde_json::Value;
use weave_core::ActionKind;

/// Kind of [`Action::AddPlugin`]
pub const ADD_PLUGIN: &str = "ADD_PLUGIN";
/// Kind of [`Action::ReplacePlugin`]
pub const REPLACE_PLUGIN: &str = "REPLACE_PLUGIN";
/// Kind of [`Action::LoadPlugin`]
pub const LOAD_PLUGIN: &str = "LOAD_PLUGIN";
/// Kind of [`Action::InstallPlugin`]
pub const INSTALL_PLUGIN: &str = "INSTALL_PLUGIN";
/// Kind of [`Action::SetPluginStatus`]
pub const SET_PLUGIN_STATUS: &str = "SET_PLUGIN_STATUS";

/// Action dispatched on a plugin store
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Register a plugin unless its key is taken
    AddPlugin(PluginRecord),

    /// Overwrite an existing plugin
    ReplacePlugin(PluginRecord),

    /// Start loading the plugin at the key
    LoadPlugin(String),

    /// Merge a loaded definition and mark it loaded
    InstallPlugin(PluginRecord),

    /// Update load status and error of the plugin at `key`
    SetPluginStatus {
        /// Plugin key
        key: String,
        /// Fields to write
        update: StatusUpdate,
    },

    /// Any application action
    Custom(CustomAction),
}

impl Action {
    /// Add action
    pub fn add(plugin: PluginRecord) -> Self {
        Self::AddPlugin(plugin)
    }

    /// Replace action
    pub fn replace(plugin: PluginRecord) -> Self {
        Self::ReplacePlugin(plugin)
    }

    /// Load action
    pub fn load(key: impl Into<String>) -> Self {
        Self::LoadPlugin(key.into())
    }

    /// Install action
    pub fn install(plugin: PluginRecord) -> Self {
        Self::InstallPlugin(plugin)
    }

    /// Set-status action
    pub fn set_status(key: impl Into<String>, update: StatusUpdate) -> Self {
        Self::SetPluginStatus {
            key: key.into(),
            update,
        }
    }

    /// Application action with a payload
    pub fn custom(action_type: impl Into<String>, payload: Value) -> Self {
        Self::Custom(CustomAction::new(action_type, payload))
    }

    /// Whether this is one of the lifecycle actions
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Key the action targets, for plugin actions
    pub fn plugin_key(&self) -> Option<&str> {
        match self {
            Self::AddPlugin(plugin) | Self::ReplacePlugin(plugin) | Self::InstallPlugin(plugin) => {
                Some(plugin.key())
            }
            Self::LoadPlugin(key) | Self::SetPluginStatus { key, .. } => Some(key),
            Self::Custom(_) => None,
        }
    }

    /// Application action payload
    pub fn as_custom(&self) -> Option<&CustomAction> {
        match self {
            Self::Custom(action) => Some(action),
            _ => None,
        }
    }
}

impl ActionKind for Action {
    fn kind(&self) -> &str {
        match self {
            Self::AddPlugin(_) => ADD_PLUGIN,
            Self::ReplacePlugin(_) => REPLACE_PLUGIN,
            Self::LoadPlugin(_) => LOAD_PLUGIN,
            Self::InstallPlugin(_) => INSTALL_PLUGIN,
            Self::SetPluginStatus { .. } => SET_PLUGIN_STATUS,
            Self::Custom(action) => &action.action_type,
        }
    }
}

/// Fields written by a set-status action
///
/// An omitted status leaves the current one in place. An omitted error
/// clears the current one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    /// New load status
    pub load_status: Option<LoadStatus>,
    /// New load error
    pub load_error: Option<LoadError>,
}

impl StatusUpdate {
    /// Update that only clears the error
    pub fn new() -> Self {
        Self::default()
    }

    /// Update to `status` that clears the error
    pub fn status(status: LoadStatus) -> Self {
        Self {
            load_status: Some(status),
            load_error: None,
        }
    }

    /// Update that records a failed load
    pub fn failed(error: LoadError) -> Self {
        Self {
            load_status: Some(LoadStatus::NotLoaded),
            load_error: Some(error),
        }
    }

    /// Set the error
    #[must_use]
    pub fn with_error(mut self, error: LoadError) -> Self {
        self.load_error = Some(error);
        self
    }
}

/// Application action routed by its type string
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAction {
    /// Action type
    pub action_type: String,
    /// Payload
    pub payload: Value,
    /// Optional metadata
    pub meta: Option<Value>,
}

impl CustomAction {
    /// Create a new action
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
            meta: None,
        }
    }

    /// Attach metadata
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl From<CustomAction> for Action {
    fn from(action: CustomAction) -> Self {
        Self::Custom(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_kinds() {
        assert_eq!(Action::add(PluginRecord::new("p")).kind(), ADD_PLUGIN);
        assert_eq!(Action::replace(PluginRecord::new("p")).kind(), REPLACE_PLUGIN);
        assert_eq!(Action::load("p").kind(), LOAD_PLUGIN);
        assert_eq!(Action::install(PluginRecord::new("p")).kind(), INSTALL_PLUGIN);
        assert_eq!(Action::set_status("p", StatusUpdate::new()).kind(), SET_PLUGIN_STATUS);
        assert_eq!(Action::custom("x", json!(5)).kind(), "x");
    }

    #[test]
    fn test_plugin_key() {
        assert_eq!(Action::load("p1").plugin_key(), Some("p1"));
        assert_eq!(Action::install(PluginRecord::new("p2")).plugin_key(), Some("p2"));
        assert_eq!(Action::custom("x", json!(null)).plugin_key(), None);
        assert!(!Action::custom("x", json!(null)).is_lifecycle());
    }

    #[test]
    fn test_status_update_builders() {
        let update = StatusUpdate::status(LoadStatus::Loading);
        assert_eq!(update.load_status, Some(LoadStatus::Loading));
        assert!(update.load_error.is_none());

        let error = LoadError::msg("boom");
        let update = StatusUpdate::failed(error.clone());
        assert_eq!(update.load_status, Some(LoadStatus::NotLoaded));
        assert_eq!(update.load_error, Some(error));
    }

    #[test]
    fn test_custom_action_meta() {
        let action = CustomAction::new("x", json!(1)).with_meta(json!({"source": "test"}));
        assert_eq!(action.meta, Some(json!({"source": "test"})));
        assert_eq!(Action::from(action).kind(), "x");
    }
}
