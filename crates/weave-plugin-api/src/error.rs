//! Plugin error types

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Error recorded on a plugin whose load attempt failed
///
/// Wraps the loader's error in an `Arc` so the value stored in state is
/// cheap to clone. Two `LoadError`s are equal when they share the same
/// underlying error.
#[derive(Clone)]
pub struct LoadError(Arc<anyhow::Error>);

impl LoadError {
    /// Wrap any error
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(error.into()))
    }

    /// Create a load error from a message
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self(Arc::new(anyhow::Error::msg(message)))
    }

    /// Underlying error
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    /// Whether both values wrap the same error instance
    pub fn same_as(&self, other: &LoadError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoadError").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl From<PluginError> for LoadError {
    fn from(error: PluginError) -> Self {
        Self::new(error)
    }
}

/// Plugin load error type
///
/// Everything that can make a load operation fail. Values are `Clone` so a
/// single outcome can be handed to every caller awaiting the same load.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PluginError {
    /// No record exists at the key
    #[error("no plugin with key '{0}' exists")]
    PluginNotFound(String),

    /// Record is neither loaded nor loadable
    #[error("plugin '{0}' must have loaded status or a load method")]
    MissingLoader(String),

    /// A load for the key is already running
    #[error("plugin '{0}' is already loading")]
    LoadInProgress(String),

    /// Loader resolved with something that is not a plugin record
    #[error("plugin must be a structured record: {0}")]
    InvalidPlugin(String),

    /// A load status wire name is not one of `NOT_LOADED`, `LOADING`, `LOADED`
    #[error("unknown load status '{0}'")]
    InvalidStatus(String),

    /// Loader reported a failure
    #[error("failed to load plugin '{key}': {source}")]
    LoadFailed {
        /// Plugin key
        key: String,
        /// Error reported by the loader
        source: LoadError,
    },
}

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

impl PluginError {
    /// Create a new plugin not found error
    pub fn not_found(key: impl fmt::Display) -> Self {
        Self::PluginNotFound(key.to_string())
    }

    /// Create a new missing loader error
    pub fn missing_loader(key: impl fmt::Display) -> Self {
        Self::MissingLoader(key.to_string())
    }

    /// Create a new load in progress error
    pub fn in_progress(key: impl fmt::Display) -> Self {
        Self::LoadInProgress(key.to_string())
    }

    /// Create a new invalid plugin error
    pub fn invalid(msg: impl fmt::Display) -> Self {
        Self::InvalidPlugin(msg.to_string())
    }

    /// Create a new invalid status error
    pub fn invalid_status(status: impl fmt::Display) -> Self {
        Self::InvalidStatus(status.to_string())
    }

    /// Create a new load failed error
    pub fn load_failed(key: impl fmt::Display, source: LoadError) -> Self {
        Self::LoadFailed {
            key: key.to_string(),
            source,
        }
    }

    /// Error the loader reported, if this is a loader failure
    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            Self::LoadFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
