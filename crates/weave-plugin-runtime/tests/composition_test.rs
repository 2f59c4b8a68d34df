//! Dynamic composition of plugin reducers and middleware

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use weave_core::{middleware_fn, ReducerMap};
use weave_plugin_api::{
    loader_fn, Action, Dispatched, LoadError, LoadedPlugin, PluginRecord, PluginStore,
    SharedMiddleware, State,
};
use weave_plugin_runtime::PluginManager;

type Log = Arc<Mutex<Vec<String>>>;

fn logging(log: &Log, tag: &'static str) -> SharedMiddleware {
    let log = Arc::clone(log);
    middleware_fn(move |_store: &PluginStore, action: Action, next| {
        log.lock().push(tag.to_string());
        next.run(action)
    })
}

fn setting_x() -> Arc<ReducerMap<State, Action>> {
    Arc::new(ReducerMap::new().on("x", |mut state: State, action: &Action| {
        if let Some(custom) = action.as_custom() {
            state.set("x", custom.payload.clone());
        }
        state
    }))
}

#[test]
fn test_applies_plugin_reducers() {
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("a").with_reducer(setting_x()));
    manager.add(PluginRecord::new("b"));

    manager.dispatch(Action::custom("x", json!(5)));

    assert_eq!(manager.state().get("x"), Some(&json!(5)));
}

#[test]
fn test_plugin_reducers_ignore_other_actions() {
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("a").with_reducer(setting_x()));

    manager.dispatch(Action::custom("y", json!(5)));

    assert_eq!(manager.state().get("x"), None);
}

#[test]
fn test_plugin_reducers_thread_state_in_order() {
    let append = |tag: &'static str| {
        weave_core::reducer_fn(move |mut state: State, action: &Action| {
            if action.as_custom().is_some() {
                let mut trail = state.get("trail").cloned().unwrap_or_else(|| json!([]));
                if let Some(items) = trail.as_array_mut() {
                    items.push(json!(tag));
                }
                state.set("trail", trail);
            }
            state
        })
    };
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("first").with_reducer(append("first")));
    manager.add(PluginRecord::new("second").with_reducer(append("second")));

    manager.dispatch(Action::custom("go", json!(null)));

    assert_eq!(manager.state().get("trail"), Some(&json!(["first", "second"])));
}

#[test]
fn test_plugin_middleware_order() {
    let log: Log = Arc::default();
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("a").with_middleware(logging(&log, "a")));
    manager.add(PluginRecord::new("c"));
    manager.add(PluginRecord::new("b").with_middleware(logging(&log, "b")));
    log.lock().clear();

    manager.dispatch(Action::custom("test", json!(null)));

    assert_eq!(*log.lock(), vec!["a", "b"]);
}

#[test]
fn test_plugin_middleware_can_short_circuit() {
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("guard").with_reducer(setting_x()).with_middleware(
        middleware_fn(|_store: &PluginStore, action: Action, next| {
            let blocked = action
                .as_custom()
                .is_some_and(|custom| custom.payload == json!("blocked"));
            if blocked {
                return Dispatched::Reduced(action);
            }
            next.run(action)
        }),
    ));

    manager.dispatch(Action::custom("x", json!("blocked")));
    assert_eq!(manager.state().get("x"), None);

    manager.dispatch(Action::custom("x", json!("allowed")));
    assert_eq!(manager.state().get("x"), Some(&json!("allowed")));
}

#[test]
fn test_new_middleware_seen_on_next_dispatch() {
    let log: Log = Arc::default();
    let manager = PluginManager::new();
    manager.dispatch(Action::custom("before", json!(null)));

    manager.add(PluginRecord::new("a").with_middleware(logging(&log, "a")));
    manager.dispatch(Action::custom("after", json!(null)));

    assert_eq!(*log.lock(), vec!["a"]);
}

#[tokio::test]
async fn test_loaded_behaviors_are_woven_in() {
    let log: Log = Arc::default();
    let loaded_log = Arc::clone(&log);
    let manager = PluginManager::new();
    manager.add(PluginRecord::new("lazy").with_loader(loader_fn(move |_store| {
        let full = PluginRecord::new("lazy")
            .with_reducer(setting_x())
            .with_middleware(logging(&loaded_log, "lazy"));
        async move { Ok::<_, LoadError>(LoadedPlugin::from(full)) }
    })));

    manager.dispatch(Action::custom("x", json!(1)));
    assert_eq!(manager.state().get("x"), None);

    manager.load("lazy").await.unwrap();
    log.lock().clear();
    manager.dispatch(Action::custom("x", json!(2)));

    assert_eq!(manager.state().get("x"), Some(&json!(2)));
    assert_eq!(*log.lock(), vec!["lazy"]);
}
