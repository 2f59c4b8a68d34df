//! Property tests for lifecycle transitions

use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use weave_plugin_api::{Action, LoadError, LoadStatus, PluginRecord, State, StatusUpdate};
use weave_plugin_runtime::transition;

fn status() -> impl Strategy<Value = LoadStatus> {
    prop_oneof![
        Just(LoadStatus::NotLoaded),
        Just(LoadStatus::Loading),
        Just(LoadStatus::Loaded),
    ]
}

fn record() -> impl Strategy<Value = PluginRecord> {
    (
        "[a-z][a-z0-9-]{0,7}",
        prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
        prop::option::of(status()),
        any::<bool>(),
    )
        .prop_map(|(key, data, status, errored)| build(key, data, status, errored))
}

fn build(
    key: String,
    data: BTreeMap<String, i64>,
    status: Option<LoadStatus>,
    errored: bool,
) -> PluginRecord {
    let mut record = data
        .into_iter()
        .fold(PluginRecord::new(key), |record, (field, value)| {
            record.with_data(field, json!(value))
        });
    if let Some(status) = status {
        record = record.with_status(status);
    }
    if errored {
        record = record.with_error(LoadError::msg("earlier failure"));
    }
    record
}

fn lifecycle_action() -> impl Strategy<Value = Action> {
    (
        prop::sample::select(vec!["a", "b", "c"]),
        record(),
        prop::option::of(status()),
        any::<bool>(),
        0..4u8,
    )
        .prop_map(|(key, record, status, errored, kind)| {
            let record = record.with_key(key);
            match kind {
                0 => Action::add(record),
                1 => Action::replace(record),
                2 => Action::install(record),
                _ => Action::set_status(
                    key,
                    StatusUpdate {
                        load_status: status,
                        load_error: errored.then(|| LoadError::msg("failed")),
                    },
                ),
            }
        })
}

fn seeded(record: &PluginRecord) -> State {
    transition(State::new(), &Action::add(record.clone())).into_state()
}

proptest! {
    #[test]
    fn duplicate_add_keeps_first_record(first in record(), second in record()) {
        let second = second.with_key(first.key());
        let state = seeded(&first);
        let before = state.plugin(first.key()).cloned();

        let state = transition(state, &Action::add(second)).into_state();

        prop_assert_eq!(state.plugin(first.key()).cloned(), before);
        prop_assert_eq!(state.plugins().len(), 1);
    }

    #[test]
    fn add_defaults_missing_status(record in record()) {
        let state = seeded(&record);
        let stored = state.plugin(record.key()).unwrap();

        let expected = record.declared_status().unwrap_or(LoadStatus::NotLoaded);
        prop_assert_eq!(stored.declared_status(), Some(expected));
    }

    #[test]
    fn replace_missing_is_noop(record in record()) {
        let outcome = transition(State::new(), &Action::replace(record));
        prop_assert!(outcome.rejection().is_some());
        prop_assert!(outcome.into_state().plugins().is_empty());
    }

    #[test]
    fn replace_resets_status_unless_given(existing in record(), incoming in record()) {
        let incoming = incoming.with_key(existing.key());
        let state = seeded(&existing.clone().with_status(LoadStatus::Loaded));

        let state = transition(state, &Action::replace(incoming.clone())).into_state();
        let stored = state.plugin(existing.key()).unwrap();

        let expected = incoming.declared_status().unwrap_or(LoadStatus::NotLoaded);
        prop_assert_eq!(stored.load_status(), expected);
        prop_assert_eq!(stored.data(), incoming.data());
    }

    #[test]
    fn install_always_marks_loaded(existing in prop::option::of(record()), incoming in record()) {
        let state = match &existing {
            Some(existing) => seeded(&existing.clone().with_key(incoming.key())),
            None => State::new(),
        };

        let state = transition(state, &Action::install(incoming.clone())).into_state();
        let stored = state.plugin(incoming.key()).unwrap();

        prop_assert_eq!(stored.load_status(), LoadStatus::Loaded);
        prop_assert!(stored.load_error().is_none());
        for (field, value) in incoming.data() {
            prop_assert_eq!(stored.get(field), Some(value));
        }
    }

    #[test]
    fn set_status_rules(
        record in record(),
        new_status in prop::option::of(status()),
        with_error in any::<bool>(),
    ) {
        let state = seeded(&record);
        let before = state.plugin(record.key()).unwrap().load_status();
        let error = LoadError::msg("failed");
        let update = StatusUpdate {
            load_status: new_status,
            load_error: with_error.then(|| error.clone()),
        };

        let state = transition(state, &Action::set_status(record.key(), update)).into_state();
        let stored = state.plugin(record.key()).unwrap();

        let status = new_status.unwrap_or(before);
        prop_assert_eq!(stored.load_status(), status);
        if with_error && status != LoadStatus::Loaded {
            prop_assert_eq!(stored.load_error(), Some(&error));
        } else {
            prop_assert!(stored.load_error().is_none());
        }
    }

    #[test]
    fn loaded_plugins_never_carry_errors(actions in prop::collection::vec(lifecycle_action(), 1..12)) {
        let state = actions
            .iter()
            .fold(State::new(), |state, action| transition(state, action).into_state());

        for record in state.plugins().iter() {
            if record.load_status() == LoadStatus::Loaded {
                prop_assert!(record.load_error().is_none(), "{} kept its error", record.key());
            }
        }
    }
}
