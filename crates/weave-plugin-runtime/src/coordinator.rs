//! Load coordinator middleware

use crate::config::{ConcurrentLoadPolicy, LoadConfig};
use crate::selector::CompositionSelector;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use weave_core::{Middleware, Next};
use weave_plugin_api::{
    Action, Dispatched, LoadError, LoadHandle, LoadStatus, PluginError, PluginLoader, PluginRecord,
    PluginStore, State, StatusUpdate, WeakLoadHandle,
};

type InFlightMap = DashMap<String, InFlight>;

/// Latch entry for a running load
///
/// Holds the load weakly: only callers and the background task keep it
/// alive.
struct InFlight {
    id: u64,
    handle: WeakLoadHandle,
}

/// Middleware driving plugin loads and added-notifications
///
/// Every action is forwarded through the middleware contributed by the
/// registered plugins before reaching the outer chain. On top of that:
///
/// - an add notifies the added plugin's hook once the record is in state
/// - a load answers with [`Dispatched::Load`], a handle resolving to the
///   installed record
///
/// At most one load per key is in flight. A second request is rejected or
/// joined according to [`ConcurrentLoadPolicy`].
///
/// A load runs while something polls its handle. With `background` set and
/// a tokio runtime available, a spawned task does so. Otherwise dropping
/// every handle before the load settles abandons it: the key reverts to
/// `NOT_LOADED` with an error and can be loaded again.
pub struct LoadCoordinator {
    selector: CompositionSelector,
    in_flight: Arc<InFlightMap>,
    notified: DashSet<String>,
    next_id: AtomicU64,
    policy: ConcurrentLoadPolicy,
    background: bool,
}

impl LoadCoordinator {
    /// Create a coordinator
    pub fn new(config: &LoadConfig) -> Self {
        Self {
            selector: CompositionSelector::new(),
            in_flight: Arc::new(DashMap::new()),
            notified: DashSet::new(),
            next_id: AtomicU64::new(1),
            policy: config.concurrent,
            background: config.background,
        }
    }

    /// Selector used for contributed middleware
    pub fn selector(&self) -> &CompositionSelector {
        &self.selector
    }

    /// Keys with a load in flight
    pub fn in_flight(&self) -> Vec<String> {
        self.in_flight.iter().map(|entry| entry.key().clone()).collect()
    }

    fn forward(
        &self,
        store: &PluginStore,
        action: Action,
        next: Next<'_, State, Action, Dispatched>,
    ) -> Dispatched {
        let composition = self.selector.select(store.state().plugins());
        composition.middleware().handle(store, action, next)
    }

    fn add(
        &self,
        store: &PluginStore,
        plugin: PluginRecord,
        next: Next<'_, State, Action, Dispatched>,
    ) -> Dispatched {
        let Some(hook) = plugin.added_hook().cloned() else {
            return self.forward(store, Action::AddPlugin(plugin), next);
        };

        let key = plugin.key().to_string();
        let existed = store.state().plugins().contains_key(&key);
        let result = self.forward(store, Action::AddPlugin(plugin), next);

        // Records are never removed, so a key enters state at most once
        let entered = !existed
            && store
                .state()
                .plugin(&key)
                .and_then(PluginRecord::added_hook)
                .is_some_and(|stored| Arc::ptr_eq(stored, &hook))
            && self.notified.insert(key.clone());
        if entered {
            debug!(plugin = %key, "Notifying plugin was added");
            hook.plugin_was_added(store);
        }

        result
    }

    fn begin_load(&self, store: &PluginStore, key: String) -> LoadHandle {
        let state = store.state();
        let Some(record) = state.plugin(&key) else {
            return LoadHandle::ready(key.clone(), Err(PluginError::not_found(&key)));
        };

        if record.load_status().is_loaded() {
            debug!(plugin = %key, "Plugin already loaded");
            return LoadHandle::ready(key, Ok(record.clone()));
        }

        let Some(loader) = record.loader().cloned() else {
            return LoadHandle::ready(key.clone(), Err(PluginError::missing_loader(&key)));
        };

        // The shard lock is released before any handle is dropped: dropping
        // the last handle of a load releases its latch entry.
        let (handle, started) = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let running = entry.get().handle.upgrade();
                match running {
                    Some(running) => (running, false),
                    // Every handle of the previous load is gone; its claim
                    // is on the way out
                    None => {
                        let (handle, in_flight) = self.load_future(store, &key, loader);
                        if let Some(in_flight) = in_flight {
                            entry.insert(in_flight);
                        }
                        (handle, true)
                    }
                }
            }
            Entry::Vacant(entry) => {
                let (handle, in_flight) = self.load_future(store, &key, loader);
                if let Some(in_flight) = in_flight {
                    entry.insert(in_flight);
                }
                (handle, true)
            }
        };

        if !started {
            return match self.policy {
                ConcurrentLoadPolicy::Join => {
                    debug!(plugin = %key, "Joining in-flight load");
                    handle
                }
                ConcurrentLoadPolicy::Reject => {
                    warn!(plugin = %key, "Load already in flight");
                    LoadHandle::ready(key.clone(), Err(PluginError::in_progress(&key)))
                }
            };
        }

        store.dispatch(Action::set_status(
            key,
            StatusUpdate::status(LoadStatus::Loading),
        ));

        if self.background {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(handle.clone());
            }
        }

        handle
    }

    fn load_future(
        &self,
        store: &PluginStore,
        key: &str,
        loader: Arc<dyn PluginLoader>,
    ) -> (LoadHandle, Option<InFlight>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut claim = Claim {
            in_flight: Arc::clone(&self.in_flight),
            store: store.clone(),
            key: key.to_string(),
            id,
            settled: false,
        };

        let handle = LoadHandle::new(key, async move {
            let outcome = run_loader(&claim.store, &claim.key, loader).await;
            match outcome {
                Ok(record) => {
                    claim.store.dispatch(Action::install(record.clone()));
                    claim.release();
                    info!(plugin = %claim.key, "Plugin loaded");
                    Ok(record)
                }
                Err(error) => {
                    warn!(plugin = %claim.key, error = %error, "Plugin load failed");
                    if claim.release() {
                        claim.store.dispatch(Action::set_status(
                            claim.key.as_str(),
                            StatusUpdate::failed(stored_error(&error)),
                        ));
                    }
                    Err(error)
                }
            }
        });

        let in_flight = handle.downgrade().map(|handle| InFlight { id, handle });
        (handle, in_flight)
    }
}

/// Ownership of one key's latch entry by a running load
///
/// Dropped unsettled means every handle went away before the load
/// finished. The latch is then released and the abandonment recorded.
struct Claim {
    in_flight: Arc<InFlightMap>,
    store: PluginStore,
    key: String,
    id: u64,
    settled: bool,
}

impl Claim {
    /// Release the latch; `true` when no newer load has taken the key
    fn release(&mut self) -> bool {
        self.settled = true;
        let id = self.id;
        self.in_flight.remove_if(&self.key, |_, entry| entry.id == id);
        !self.in_flight.contains_key(&self.key)
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if self.release() {
            warn!(plugin = %self.key, "Load abandoned before it settled");
            self.store.dispatch(Action::set_status(
                self.key.as_str(),
                StatusUpdate::failed(LoadError::msg("load was abandoned before it settled")),
            ));
        }
    }
}

async fn run_loader(
    store: &PluginStore,
    key: &str,
    loader: Arc<dyn PluginLoader>,
) -> Result<PluginRecord, PluginError> {
    debug!(plugin = %key, "Invoking loader");

    let loaded = match AssertUnwindSafe(loader.load(store.clone()))
        .catch_unwind()
        .await
    {
        Ok(Ok(loaded)) => loaded,
        Ok(Err(error)) => return Err(PluginError::load_failed(key, error)),
        Err(panic) => {
            let error = LoadError::msg(format!("loader panicked: {}", panic_message(&*panic)));
            return Err(PluginError::load_failed(key, error));
        }
    };

    loaded.into_record().map(|record| record.with_key(key))
}

/// Error to record on the plugin for a failed load
fn stored_error(error: &PluginError) -> LoadError {
    match error.load_error() {
        Some(source) => source.clone(),
        None => LoadError::from(error.clone()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Middleware<State, Action, Dispatched> for LoadCoordinator {
    fn handle(
        &self,
        store: &PluginStore,
        action: Action,
        next: Next<'_, State, Action, Dispatched>,
    ) -> Dispatched {
        match action {
            Action::AddPlugin(plugin) => self.add(store, plugin, next),
            Action::LoadPlugin(key) => {
                self.forward(store, Action::LoadPlugin(key.clone()), next);
                Dispatched::Load(self.begin_load(store, key))
            }
            action => self.forward(store, action, next),
        }
    }
}

impl fmt::Debug for LoadCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadCoordinator")
            .field("in_flight", &self.in_flight.len())
            .field("policy", &self.policy)
            .field("background", &self.background)
            .finish()
    }
}
