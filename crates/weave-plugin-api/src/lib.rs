//! # Weave Plugin API
//!
//! This crate provides the data model shared by plugin authors and the
//! plugin runtime.
//!
//! ## Building Blocks
//!
//! - **Plugin records**: identity, load status, data and contributed behavior
//! - **Actions**: the lifecycle vocabulary plus application actions
//! - **Loaders**: async or callback-driven resolution of a plugin's full definition
//! - **Hooks**: a callback run right after a plugin is added
//!
//! ## Example
//!
//! ```rust
//! use weave_plugin_api::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let stub = PluginRecord::new("charts")
//!     .with_data("title", json!("Charts"))
//!     .with_loader(loader_fn(|_store| async {
//!         let full = PluginRecord::new("charts").with_data("widgets", json!(["bar", "line"]));
//!         Ok::<_, LoadError>(LoadedPlugin::from(full))
//!     }))
//!     .on_added(Arc::new(|store: &PluginStore| {
//!         let _ = store.state();
//!     }));
//!
//! assert_eq!(stub.load_status(), LoadStatus::NotLoaded);
//! let action = Action::add(stub);
//! assert_eq!(action.plugin_key(), Some("charts"));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod action;
pub mod collection;
pub mod dispatch;
pub mod error;
pub mod hook;
pub mod loader;
pub mod merge;
pub mod plugin;
pub mod state;

#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used types
pub use action::{
    Action, CustomAction, StatusUpdate, ADD_PLUGIN, INSTALL_PLUGIN, LOAD_PLUGIN, REPLACE_PLUGIN,
    SET_PLUGIN_STATUS,
};
pub use collection::PluginCollection;
pub use dispatch::{Dispatched, LoadHandle, WeakLoadHandle};
pub use error::{LoadError, PluginError, Result};
pub use hook::PluginWasAdded;
pub use loader::{callback_loader, loader_fn, Completion, LoadedPlugin, PluginLoader};
pub use plugin::{LoadStatus, PluginInfo, PluginRecord};
pub use state::{PluginStore, SharedMiddleware, SharedReducer, State};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::action::{Action, CustomAction, StatusUpdate};
    pub use crate::dispatch::{Dispatched, LoadHandle};
    pub use crate::error::{LoadError, PluginError};
    pub use crate::hook::PluginWasAdded;
    pub use crate::loader::{callback_loader, loader_fn, Completion, LoadedPlugin, PluginLoader};
    pub use crate::plugin::{LoadStatus, PluginRecord};
    pub use crate::state::{PluginStore, SharedMiddleware, SharedReducer, State};
    pub use async_trait::async_trait;
    pub use weave_core::{middleware_fn, reducer_fn, ActionKind, Next, ReducerMap};
}
