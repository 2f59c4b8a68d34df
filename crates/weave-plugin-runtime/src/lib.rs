//! # Weave Plugin Runtime
//!
//! Lifecycle management and dynamic composition for Weave plugins.
//!
//! ## Features
//!
//! - **Lifecycle Reducer**: Add, replace, install and set-status transitions
//! - **Load Coordination**: Async loads with at most one in flight per key
//! - **Dynamic Composition**: Plugin reducers and middleware woven into every dispatch
//! - **Added Hooks**: Plugins notified once they enter the registry
//!
//! ## Example
//!
//! ```rust,no_run
//! use weave_plugin_runtime::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> weave_plugin_runtime::Result<()> {
//! let manager = PluginManager::new();
//!
//! manager.add(PluginRecord::new("charts").with_loader(loader_fn(|_store| async {
//!     let full = PluginRecord::new("charts").with_data("widgets", json!(["bar"]));
//!     Ok::<_, LoadError>(LoadedPlugin::from(full))
//! })));
//!
//! let charts = manager.load("charts").await?;
//! assert_eq!(charts.get("widgets"), Some(&json!(["bar"])));
//! assert_eq!(manager.get("charts").unwrap().load_status(), LoadStatus::Loaded);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod manager;
pub mod reducer;
pub mod selector;
pub mod telemetry;

pub use config::{ConcurrentLoadPolicy, ConfigFormat, LoadConfig, LogConfig, LogFormat, RuntimeConfig};
pub use coordinator::LoadCoordinator;
pub use error::{PluginRuntimeError, Result};
pub use manager::{PluginManager, PluginManagerBuilder, PluginStats};
pub use reducer::{transition, LifecycleReducer, Rejection, Transition};
pub use selector::{Composition, CompositionSelector};
pub use telemetry::init_tracing;

// Re-export plugin API types for convenience
pub use weave_plugin_api::{
    Action, Dispatched, LoadError, LoadHandle, LoadStatus, PluginError, PluginInfo, PluginRecord,
    PluginStore, State, StatusUpdate,
};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::error::{PluginRuntimeError, Result};
    pub use crate::manager::PluginManager;
    pub use weave_plugin_api::prelude::*;
}
