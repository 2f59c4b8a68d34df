// Dispatch and composition benchmarks
//
// Run with: cargo bench -p weave-plugin-runtime --bench dispatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use weave_core::{middleware_fn, reducer_fn};
use weave_plugin_api::{Action, PluginCollection, PluginRecord, PluginStore, State};
use weave_plugin_runtime::{Composition, CompositionSelector, PluginManager};

const SIZES: [usize; 3] = [1, 10, 50];

fn plugin(index: usize) -> PluginRecord {
    let field = format!("count_{index}");
    PluginRecord::new(format!("plugin-{index}"))
        .with_reducer(reducer_fn(move |mut state: State, action: &Action| {
            if action.as_custom().is_some() {
                let count = state.get(&field).and_then(|v| v.as_i64()).unwrap_or(0);
                state.set(field.clone(), json!(count + 1));
            }
            state
        }))
        .with_middleware(middleware_fn(|_store: &PluginStore, action: Action, next| {
            next.run(action)
        }))
}

fn collection(size: usize) -> PluginCollection {
    (0..size).map(plugin).collect()
}

fn benchmark_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    for size in SIZES {
        let manager = PluginManager::new();
        for index in 0..size {
            manager.add(plugin(index));
        }

        group.bench_with_input(BenchmarkId::new("custom_action", size), &size, |b, _| {
            b.iter(|| black_box(manager.dispatch(Action::custom("tick", json!(null)))));
        });
    }

    group.finish();
}

fn benchmark_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");

    for size in SIZES {
        let plugins = collection(size);
        let selector = CompositionSelector::new();
        selector.select(&plugins);

        group.bench_with_input(BenchmarkId::new("memoized", size), &plugins, |b, plugins| {
            b.iter(|| black_box(selector.select(plugins)));
        });

        group.bench_with_input(BenchmarkId::new("recomputed", size), &plugins, |b, plugins| {
            b.iter(|| black_box(Composition::from_plugins(plugins)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_dispatch, benchmark_composition);
criterion_main!(benches);
