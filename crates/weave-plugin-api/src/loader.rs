//! Plugin loaders
//!
//! A loader resolves a registered stub into the plugin's full definition.
//! Loaders come in two flavors, both adapted to the single
//! [`PluginLoader`] trait:
//!
//! - [`loader_fn`]: an async closure returning the outcome
//! - [`callback_loader`]: a closure that reports through a [`Completion`],
//!   possibly from another task or thread

use crate::error::{LoadError, PluginError};
use crate::plugin::PluginRecord;
use crate::state::PluginStore;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// What a loader resolves with
#[derive(Debug, Clone)]
pub enum LoadedPlugin {
    /// A ready plugin record
    Record(PluginRecord),

    /// A JSON manifest to be turned into a record
    Manifest(Value),
}

impl LoadedPlugin {
    /// Convert into a plugin record
    ///
    /// Fails with [`PluginError::InvalidPlugin`] when a manifest is not a
    /// JSON object, and [`PluginError::InvalidStatus`] when its
    /// `loadStatus` is not a known wire name.
    pub fn into_record(self) -> Result<PluginRecord, PluginError> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Manifest(manifest) => PluginRecord::from_manifest(manifest),
        }
    }
}

impl From<PluginRecord> for LoadedPlugin {
    fn from(record: PluginRecord) -> Self {
        Self::Record(record)
    }
}

impl From<Value> for LoadedPlugin {
    fn from(manifest: Value) -> Self {
        Self::Manifest(manifest)
    }
}

/// Asynchronous loader of a plugin's full definition
#[async_trait]
pub trait PluginLoader: Send + Sync {
    /// Load the plugin
    ///
    /// # Arguments
    ///
    /// * `store` - The store the plugin is being loaded into
    async fn load(&self, store: PluginStore) -> Result<LoadedPlugin, LoadError>;
}

struct FnLoader<F>(F);

#[async_trait]
impl<F, Fut> PluginLoader for FnLoader<F>
where
    F: Fn(PluginStore) -> Fut + Send + Sync,
    Fut: Future<Output = Result<LoadedPlugin, LoadError>> + Send,
{
    async fn load(&self, store: PluginStore) -> Result<LoadedPlugin, LoadError> {
        (self.0)(store).await
    }
}

/// Wrap an async closure as a loader
pub fn loader_fn<F, Fut>(f: F) -> Arc<dyn PluginLoader>
where
    F: Fn(PluginStore) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LoadedPlugin, LoadError>> + Send + 'static,
{
    Arc::new(FnLoader(f))
}

/// One-shot completion callback handed to callback loaders
///
/// Consumed by the first answer, so only one outcome is ever reported.
/// Dropping it unanswered fails the load.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<Result<LoadedPlugin, LoadError>>,
}

impl Completion {
    /// Report an outcome
    pub fn complete(self, result: Result<LoadedPlugin, LoadError>) {
        // The receiver is gone only if the load future was dropped
        let _ = self.sender.send(result);
    }

    /// Report success
    pub fn succeed(self, plugin: impl Into<LoadedPlugin>) {
        self.complete(Ok(plugin.into()));
    }

    /// Report failure
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.complete(Err(LoadError::new(error)));
    }
}

struct CallbackLoader<F>(F);

#[async_trait]
impl<F> PluginLoader for CallbackLoader<F>
where
    F: Fn(PluginStore, Completion) + Send + Sync,
{
    async fn load(&self, store: PluginStore) -> Result<LoadedPlugin, LoadError> {
        let (sender, receiver) = oneshot::channel();
        (self.0)(store, Completion { sender });
        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(LoadError::msg(
                "loader dropped its completion callback without a result",
            )),
        }
    }
}

/// Wrap a completion-callback closure as a loader
pub fn callback_loader<F>(f: F) -> Arc<dyn PluginLoader>
where
    F: Fn(PluginStore, Completion) + Send + Sync + 'static,
{
    Arc::new(CallbackLoader(f))
}

impl<F> fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnLoader")
    }
}

impl<F> fmt::Debug for CallbackLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackLoader")
    }
}
