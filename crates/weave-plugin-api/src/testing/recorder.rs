//! Middleware that records every action it sees

use crate::action::Action;
use crate::dispatch::Dispatched;
use crate::state::{PluginStore, SharedMiddleware, State};
use parking_lot::Mutex;
use std::sync::Arc;
use weave_core::{ActionKind, Middleware, Next};

/// Recording middleware
///
/// Clones share one log, so a test can keep a handle while the store owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ActionRecorder {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl ActionRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// This recorder as shared middleware
    pub fn middleware(&self) -> SharedMiddleware {
        Arc::new(self.clone())
    }

    /// Recorded actions, oldest first
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    /// Kinds of the recorded actions, oldest first
    pub fn kinds(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .map(|action| action.kind().to_string())
            .collect()
    }

    /// Number of recorded actions
    pub fn count(&self) -> usize {
        self.actions.lock().len()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.actions.lock().clear();
    }
}

impl Middleware<State, Action, Dispatched> for ActionRecorder {
    fn handle(
        &self,
        _store: &PluginStore,
        action: Action,
        next: Next<'_, State, Action, Dispatched>,
    ) -> Dispatched {
        self.actions.lock().push(action.clone());
        next.run(action)
    }
}
