//! Plugin runtime error types

use std::fmt;
use weave_plugin_api::PluginError;

/// Plugin runtime error type
#[derive(Debug, thiserror::Error)]
pub enum PluginRuntimeError {
    /// Plugin error
    #[error("Plugin error: {0}")]
    PluginError(#[from] PluginError),

    /// A load action never reached the load coordinator
    #[error("Load of plugin '{0}' was intercepted before it started")]
    LoadIntercepted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    TracingError(String),
}

/// Result type for plugin runtime operations
pub type Result<T> = std::result::Result<T, PluginRuntimeError>;

impl PluginRuntimeError {
    /// Create a new config error
    pub fn config(msg: impl fmt::Display) -> Self {
        Self::ConfigError(msg.to_string())
    }

    /// Create a new tracing error
    pub fn tracing(msg: impl fmt::Display) -> Self {
        Self::TracingError(msg.to_string())
    }
}
