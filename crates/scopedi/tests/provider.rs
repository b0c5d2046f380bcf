//! Registration and graph-validation behavior, under both strategies

mod common;

use std::sync::Arc;

use common::{A, B, C, D, D1, MODES};
use scopedi::{
    build_container, BindingSpec, Error, Key, Provider, Recipe, Scope, StrategyMode,
};

#[test]
fn build_fails_on_a_cycle_naming_the_path() {
    for mode in MODES {
        let d = Key::new("D");
        let c = Key::new("C");
        let b = Key::new("B");
        let a = Key::new("A");

        let mut provider = Provider::new(Scope::App);
        provider.provide_factory(d, [a], |_| Ok(D)).unwrap();
        provider
            .provide_factory(c, [d], |args| Ok(C { d: args.get(0)? }))
            .unwrap();
        provider.provide_factory(b, [], |_| Ok(B)).unwrap();
        provider
            .provide_factory(a, [b, c], |args| {
                Ok(A {
                    b: args.get(0)?,
                    c: args.get(1)?,
                })
            })
            .unwrap();

        match build_container(Scope::App, &[provider], mode) {
            Err(Error::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["D", "A", "C", "D"]);
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }
}

#[test]
fn build_fails_on_a_missing_binding() {
    for mode in MODES {
        let d = Key::new("D");
        let c = Key::new("C");
        let b = Key::new("B");
        let a = Key::new("A");

        let mut provider = Provider::new(Scope::App);
        provider
            .provide_factory(c, [d], |args| Ok(C { d: args.get(0)? }))
            .unwrap();
        provider.provide_factory(b, [], |_| Ok(B)).unwrap();
        provider
            .provide_factory(a, [b, c], |args| {
                Ok(A {
                    b: args.get(0)?,
                    c: args.get(1)?,
                })
            })
            .unwrap();

        match build_container(Scope::App, &[provider], mode) {
            Err(Error::MissingDependency { key }) => assert_eq!(key, "D"),
            other => panic!("expected a missing-binding error, got {other:?}"),
        }
    }
}

#[test]
fn build_fails_when_a_dependency_lives_in_a_narrower_scope() {
    for mode in MODES {
        let d = Key::new("D");
        let c = Key::new("C");
        let b = Key::new("B");
        let a = Key::new("A");

        let mut app_provider = Provider::new(Scope::App);
        app_provider
            .provide_factory(c, [d], |args| Ok(C { d: args.get(0)? }))
            .unwrap();
        app_provider.provide_factory(b, [], |_| Ok(B)).unwrap();

        let mut request_provider = Provider::new(Scope::Request);
        request_provider
            .provide_factory(a, [b, c], |args| {
                Ok(A {
                    b: args.get(0)?,
                    c: args.get(1)?,
                })
            })
            .unwrap();
        request_provider.provide_factory(d, [], |_| Ok(D)).unwrap();

        match build_container(Scope::App, &[app_provider, request_provider], mode) {
            Err(Error::ScopeViolation { key, dependency }) => {
                assert_eq!(key, "C");
                assert_eq!(dependency, "D");
            }
            other => panic!("expected a scope-violation error, got {other:?}"),
        }
    }
}

#[test]
fn an_unflagged_duplicate_key_fails_the_build() {
    for mode in MODES {
        let d = Key::new("D");

        let mut first = Provider::new(Scope::App);
        first.provide_factory(d, [], |_| Ok(D)).unwrap();

        let mut second = Provider::new(Scope::App);
        second.provide_factory(d, [], |_| Ok(D)).unwrap();

        match build_container(Scope::App, &[first, second], mode) {
            Err(Error::DuplicateBinding { key }) => assert_eq!(key, "D"),
            other => panic!("expected a duplicate-binding error, got {other:?}"),
        }
    }
}

#[test]
fn a_flagged_override_replaces_the_earlier_binding() {
    for mode in MODES {
        let d = Key::new("D");

        let mut first = Provider::new(Scope::App);
        first.provide_factory(d, [], |_| Ok(D)).unwrap();

        let mut second = Provider::new(Scope::App);
        second
            .provide(
                d,
                BindingSpec::new(Recipe::factory(|_| Ok(D1))).with_override(true),
            )
            .unwrap();

        let container = build_container(Scope::App, &[first, second], mode).unwrap();
        let resolved: Arc<D1> = container.get_as(d).unwrap();
        drop(resolved);
        container.close().unwrap();
    }
}

#[test]
fn every_registration_shape_resolves() {
    for mode in MODES {
        let value_key = Key::new("value");
        let plain = Key::new("plain");
        let with_deps = Key::new("with_deps");
        let resource = Key::new("resource");

        let mut provider = Provider::new(Scope::App);
        provider.provide_value(value_key, D).unwrap();
        provider.provide_factory(plain, [], |_| Ok(B)).unwrap();
        provider
            .provide_factory(with_deps, [value_key], |args| Ok(C { d: args.get(0)? }))
            .unwrap();
        provider
            .provide_resource(resource, [], |_| Ok((B, || Ok(()))))
            .unwrap();

        let container = build_container(Scope::App, &[provider], mode).unwrap();
        let _: Arc<D> = container.get_as(value_key).unwrap();
        let _: Arc<B> = container.get_as(plain).unwrap();
        let chained: Arc<C> = container.get_as(with_deps).unwrap();
        let value: Arc<D> = container.get_as(value_key).unwrap();
        assert!(Arc::ptr_eq(&chained.d, &value));
        let _: Arc<B> = container.get_as(resource).unwrap();
        container.close().unwrap();
    }
}

#[test]
fn a_value_recipe_with_dependencies_is_a_usage_error() {
    let dep = Key::new("dep");
    let key = Key::new("value");

    let mut provider = Provider::new(Scope::App);
    let result = provider.provide(key, BindingSpec::new(Recipe::value(D)).with_deps([dep]));
    assert!(matches!(result, Err(Error::Usage { .. })));
}

#[test]
fn a_synchronous_build_rejects_a_suspension_requiring_recipe() {
    for mode in MODES {
        let d = Key::new("D");

        let mut provider = Provider::new(Scope::App);
        provider
            .provide_async_factory(d, [], |_| async { Ok(D) })
            .unwrap();

        match build_container(Scope::App, &[provider], mode) {
            Err(Error::ConcurrencyCompatibility { key }) => assert_eq!(key, "D"),
            other => panic!("expected a concurrency-compatibility error, got {other:?}"),
        }
    }
}

#[test]
fn a_synchronous_build_rejects_a_suspension_requiring_resource() {
    for mode in MODES {
        let d = Key::new("D");

        let mut provider = Provider::new(Scope::App);
        provider
            .provide_async_resource(d, [], |_| async { Ok((D, || async { Ok(()) })) })
            .unwrap();

        assert!(matches!(
            build_container(Scope::App, &[provider], mode),
            Err(Error::ConcurrencyCompatibility { .. })
        ));
    }
}

#[test]
fn strategy_modes_default_to_direct() {
    assert_eq!(StrategyMode::default(), StrategyMode::Direct);
}
