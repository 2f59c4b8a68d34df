//! Lifecycle reducer
//!
//! [`transition`] is the pure lifecycle state machine. It reports why an
//! action was rejected instead of failing. [`LifecycleReducer`] wraps it as
//! the store's root reducer: it logs rejections, then hands the resulting
//! state to the reducers contributed by the registered plugins.

use crate::selector::CompositionSelector;
use std::fmt;
use tracing::{trace, warn};
use weave_core::{ActionKind, Reducer};
use weave_plugin_api::{Action, LoadStatus, PluginRecord, State, StatusUpdate};

/// Reason a lifecycle action left the state unchanged
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Record has an empty key
    #[error("plugin key must be a non-empty string")]
    InvalidKey,

    /// Add targeted a key that is taken
    #[error("plugin already exists for key: {0}")]
    AlreadyExists(String),

    /// Replace or set-status targeted a missing key
    #[error("missing plugin for key: {0}")]
    MissingPlugin(String),
}

/// Outcome of applying an action to the plugin lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The action changed the state
    Applied(State),

    /// The action was a lifecycle action but was rejected
    Rejected {
        /// Why
        reason: Rejection,
        /// The unchanged state
        state: State,
    },

    /// The action is not a lifecycle action
    Unhandled(State),
}

impl Transition {
    /// Resulting state, whatever the outcome
    pub fn into_state(self) -> State {
        match self {
            Self::Applied(state) | Self::Unhandled(state) => state,
            Self::Rejected { state, .. } => state,
        }
    }

    /// Rejection reason, if rejected
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether the action changed the state
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Apply a lifecycle action to `state`
///
/// Handles add, replace, install and set-status. Load and application
/// actions come back as [`Transition::Unhandled`].
pub fn transition(state: State, action: &Action) -> Transition {
    match action {
        Action::AddPlugin(plugin) => add(state, plugin),
        Action::ReplacePlugin(plugin) => replace(state, plugin),
        Action::InstallPlugin(plugin) => install(state, plugin),
        Action::SetPluginStatus { key, update } => set_status(state, key, update),
        Action::LoadPlugin(_) | Action::Custom(_) => Transition::Unhandled(state),
    }
}

fn rejected(reason: Rejection, state: State) -> Transition {
    Transition::Rejected { reason, state }
}

/// A loaded plugin never carries an error
fn settled(mut record: PluginRecord) -> PluginRecord {
    if record.load_status().is_loaded() {
        record.clear_load_error();
    }
    record
}

fn add(mut state: State, plugin: &PluginRecord) -> Transition {
    if !plugin.has_valid_key() {
        return rejected(Rejection::InvalidKey, state);
    }
    if state.plugins().contains_key(plugin.key()) {
        return rejected(Rejection::AlreadyExists(plugin.key().to_string()), state);
    }

    let plugins = state
        .plugins()
        .inserted(settled(plugin.clone().with_default_status()));
    state.set_plugins(plugins);
    Transition::Applied(state)
}

fn replace(mut state: State, plugin: &PluginRecord) -> Transition {
    if !plugin.has_valid_key() {
        return rejected(Rejection::InvalidKey, state);
    }
    if !state.plugins().contains_key(plugin.key()) {
        return rejected(Rejection::MissingPlugin(plugin.key().to_string()), state);
    }

    let plugins = state
        .plugins()
        .inserted(settled(plugin.clone().with_default_status()));
    state.set_plugins(plugins);
    Transition::Applied(state)
}

fn install(mut state: State, plugin: &PluginRecord) -> Transition {
    if !plugin.has_valid_key() {
        return rejected(Rejection::InvalidKey, state);
    }

    let mut record = match state.plugin(plugin.key()) {
        Some(existing) => existing.clone().merge_deep(plugin.clone()),
        None => plugin.clone(),
    };
    record.set_load_status(LoadStatus::Loaded);

    let plugins = state.plugins().inserted(settled(record));
    state.set_plugins(plugins);
    Transition::Applied(state)
}

fn set_status(mut state: State, key: &str, update: &StatusUpdate) -> Transition {
    let updated = state.plugins().updated(key, |mut record| {
        if let Some(status) = update.load_status {
            record.set_load_status(status);
        }
        match &update.load_error {
            Some(error) => record.set_load_error(error.clone()),
            None => record.clear_load_error(),
        }
        settled(record)
    });

    match updated {
        Some(plugins) => {
            state.set_plugins(plugins);
            Transition::Applied(state)
        }
        None => rejected(Rejection::MissingPlugin(key.to_string()), state),
    }
}

/// Root reducer of a plugin store
pub struct LifecycleReducer {
    selector: CompositionSelector,
    log_rejections: bool,
}

impl LifecycleReducer {
    /// Create a reducer that logs rejections
    pub fn new() -> Self {
        Self {
            selector: CompositionSelector::new(),
            log_rejections: true,
        }
    }

    /// Enable or disable rejection logging
    #[must_use]
    pub fn with_rejection_logging(mut self, enabled: bool) -> Self {
        self.log_rejections = enabled;
        self
    }

    /// Selector used for contributed reducers
    pub fn selector(&self) -> &CompositionSelector {
        &self.selector
    }
}

impl Default for LifecycleReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LifecycleReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleReducer")
            .field("selector", &self.selector)
            .field("log_rejections", &self.log_rejections)
            .finish()
    }
}

impl Reducer<State, Action> for LifecycleReducer {
    fn reduce(&self, state: State, action: &Action) -> State {
        let state = match transition(state, action) {
            Transition::Rejected { reason, state } => {
                if self.log_rejections {
                    warn!(action = action.kind(), reason = %reason, "Lifecycle action ignored");
                }
                state
            }
            Transition::Applied(state) => {
                trace!(action = action.kind(), plugin = ?action.plugin_key(), "Lifecycle action applied");
                state
            }
            Transition::Unhandled(state) => state,
        };

        let composition = self.selector.select(state.plugins());
        composition.reducer().reduce(state, action)
    }
}
