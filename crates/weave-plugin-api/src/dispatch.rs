//! Dispatch results

use crate::action::Action;
use crate::error::PluginError;
use crate::plugin::PluginRecord;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

type LoadFuture = BoxFuture<'static, Result<PluginRecord, PluginError>>;

/// Value returned by dispatching an action on a plugin store
#[derive(Debug)]
pub enum Dispatched {
    /// The action reached the reducer
    Reduced(Action),

    /// A load was requested; await the handle for its outcome
    Load(LoadHandle),
}

impl Dispatched {
    /// Load handle, if the dispatch started or joined a load
    pub fn into_load(self) -> Option<LoadHandle> {
        match self {
            Self::Load(handle) => Some(handle),
            Self::Reduced(_) => None,
        }
    }

    /// Reduced action, if the dispatch reached the reducer
    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Reduced(action) => Some(action),
            Self::Load(_) => None,
        }
    }

    /// Whether this carries a load handle
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load(_))
    }
}

impl From<Action> for Dispatched {
    fn from(action: Action) -> Self {
        Self::Reduced(action)
    }
}

/// Awaitable outcome of a load operation
///
/// Handles are clonable; every clone resolves to the same outcome. Work
/// runs when a clone is polled, so a handle nobody awaits or spawns never
/// makes progress. Dropping every clone of a pending handle drops the work.
#[derive(Clone)]
pub struct LoadHandle {
    key: String,
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Settled(Result<PluginRecord, PluginError>),
    Pending(Shared<LoadFuture>),
}

impl LoadHandle {
    /// Handle driving `future`
    pub fn new<F>(key: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<PluginRecord, PluginError>> + Send + 'static,
    {
        Self {
            key: key.into(),
            inner: Inner::Pending(future.boxed().shared()),
        }
    }

    /// Handle that is already settled
    pub fn ready(key: impl Into<String>, result: Result<PluginRecord, PluginError>) -> Self {
        Self {
            key: key.into(),
            inner: Inner::Settled(result),
        }
    }

    /// Key being loaded
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Outcome, if the load has settled
    pub fn peek(&self) -> Option<&Result<PluginRecord, PluginError>> {
        match &self.inner {
            Inner::Settled(result) => Some(result),
            Inner::Pending(shared) => shared.peek(),
        }
    }

    /// Reference that does not keep the load alive
    ///
    /// `None` once the handle has settled; there is no work left to track.
    pub fn downgrade(&self) -> Option<WeakLoadHandle> {
        match &self.inner {
            Inner::Settled(_) => None,
            Inner::Pending(shared) => shared.downgrade().map(|inner| WeakLoadHandle {
                key: self.key.clone(),
                inner,
            }),
        }
    }
}

impl Future for LoadHandle {
    type Output = Result<PluginRecord, PluginError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Settled(result) => Poll::Ready(result.clone()),
            Inner::Pending(shared) => Pin::new(shared).poll(cx),
        }
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("LoadHandle")
            .field("key", &self.key)
            .field("status", &status)
            .finish()
    }
}

/// Weak reference to a pending [`LoadHandle`]
#[derive(Clone)]
pub struct WeakLoadHandle {
    key: String,
    inner: WeakShared<LoadFuture>,
}

impl WeakLoadHandle {
    /// Key being loaded
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Strong handle, unless every strong handle has been dropped
    pub fn upgrade(&self) -> Option<LoadHandle> {
        self.inner.upgrade().map(|inner| LoadHandle {
            key: self.key.clone(),
            inner: Inner::Pending(inner),
        })
    }
}

impl fmt::Debug for WeakLoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakLoadHandle").field("key", &self.key).finish()
    }
}
