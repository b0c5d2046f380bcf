//! Resolution throughput for both strategies and both container variants:
//! a three-branch, four-deep dependency tree resolved inside a fresh
//! request scope per iteration.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use scopedi::{
    build_async_container, build_container, Args, Key, Provider, Result, Scope, StrategyMode,
};

struct Svc;

fn link(provider: &mut Provider, key: Key, deps: Vec<Key>) {
    provider
        .provide_factory(key, deps, |args: Args| {
            for index in 0..args.len() {
                let _: Arc<Svc> = args.get(index)?;
            }
            Ok(Svc)
        })
        .unwrap();
}

const BRANCHES: [[&str; 4]; 3] = [
    ["bbbb", "bbb", "bb", "b"],
    ["cccc", "ccc", "cc", "c"],
    ["dddd", "ddd", "dd", "d"],
];

/// Three chains of four services each, joined by one request-scoped root.
fn providers() -> (Key, Vec<Provider>) {
    let mut app = Provider::new(Scope::App);

    let mut branch_roots = Vec::new();
    for names in BRANCHES {
        let mut previous: Option<Key> = None;
        for name in names {
            let key = Key::new(name);
            link(&mut app, key, previous.into_iter().collect());
            previous = Some(key);
        }
        branch_roots.extend(previous);
    }

    let a = Key::new("a");
    let mut request = Provider::new(Scope::Request);
    link(&mut request, a, branch_roots);

    (a, vec![app, request])
}

fn bench_sync_resolve(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sync_resolve");
    for mode in [StrategyMode::Direct, StrategyMode::Specialized] {
        let (a, providers) = providers();
        let app = build_container(Scope::App, &providers, mode).unwrap();

        group.bench_function(format!("{mode:?}"), |bencher| {
            bencher.iter(|| {
                app.with_nested_scope_at(Scope::Request, |request| request.get(a).map(|_| ()))
                    .unwrap();
            });
        });
    }
    group.finish();
}

fn bench_async_resolve(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    let mut group = criterion.benchmark_group("async_resolve");
    for mode in [StrategyMode::Direct, StrategyMode::Specialized] {
        let (a, providers) = providers();
        let app = build_async_container(Scope::App, &providers, mode).unwrap();

        group.bench_function(format!("{mode:?}"), |bencher| {
            bencher.to_async(&runtime).iter(|| {
                let app = app.clone();
                async move {
                    app.with_nested_scope_at(Scope::Request, |request| async move {
                        request.get(a).await.map(|_| ())
                    })
                    .await
                    .unwrap();
                }
            });
        });
    }
    group.finish();
}

fn bench_build(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("build");
    for mode in [StrategyMode::Direct, StrategyMode::Specialized] {
        let (_, providers) = providers();

        group.bench_function(format!("{mode:?}"), |bencher| {
            bencher.iter(|| -> Result<()> {
                let container = build_container(Scope::App, &providers, mode)?;
                container.close()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sync_resolve, bench_async_resolve, bench_build);
criterion_main!(benches);
