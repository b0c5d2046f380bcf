//! Binding registries
//!
//! A [`Provider`] collects the bindings declared for one scope level, in
//! declaration order, and merges them into the shared dependency graph when
//! a container is built.

use std::future::Future;

use crate::binding::{Args, BindingSpec, Recipe};
use crate::error::{Error, Result};
use crate::graph::{Graph, Node};
use crate::key::Key;
use crate::scope::Scope;

/// Ordered collection of bindings declared for one scope level.
pub struct Provider {
    scope: Scope,
    bindings: Vec<(Key, BindingSpec)>,
}

impl Provider {
    /// Create a registry bound to one scope level
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            bindings: Vec::new(),
        }
    }

    /// Scope level every binding in this registry is declared at
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Number of declared bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no binding has been declared yet
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Declare one binding from a normalized record.
    ///
    /// Malformed records are rejected here, at registration time.
    pub fn provide(&mut self, key: Key, spec: BindingSpec) -> Result<()> {
        spec.validate()?;
        self.bindings.push((key, spec));
        Ok(())
    }

    /// Declare a prebuilt value for `key`
    pub fn provide_value<T>(&mut self, key: Key, value: T) -> Result<()>
    where
        T: Send + Sync + 'static,
    {
        self.provide(key, BindingSpec::new(Recipe::value(value)))
    }

    /// Declare a synchronous factory for `key` over `deps`
    pub fn provide_factory<T, F, I>(&mut self, key: Key, deps: I, factory: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
        I: IntoIterator<Item = Key>,
    {
        self.provide(
            key,
            BindingSpec::new(Recipe::factory(factory)).with_deps(deps),
        )
    }

    /// Declare a synchronous scoped-resource factory for `key` over `deps`
    pub fn provide_resource<T, F, R, I>(&mut self, key: Key, deps: I, factory: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Result<(T, R)> + Send + Sync + 'static,
        R: FnOnce() -> Result<()> + Send + 'static,
        I: IntoIterator<Item = Key>,
    {
        self.provide(
            key,
            BindingSpec::new(Recipe::resource(factory)).with_deps(deps),
        )
    }

    /// Declare a suspension-requiring factory for `key` over `deps`
    pub fn provide_async_factory<T, F, Fut, I>(&mut self, key: Key, deps: I, factory: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        I: IntoIterator<Item = Key>,
    {
        self.provide(
            key,
            BindingSpec::new(Recipe::async_factory(factory)).with_deps(deps),
        )
    }

    /// Declare a suspension-requiring scoped-resource factory for `key` over `deps`
    pub fn provide_async_resource<T, F, Fut, R, RFut, I>(
        &mut self,
        key: Key,
        deps: I,
        factory: F,
    ) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(T, R)>> + Send + 'static,
        R: FnOnce() -> RFut + Send + 'static,
        RFut: Future<Output = Result<()>> + Send + 'static,
        I: IntoIterator<Item = Key>,
    {
        self.provide(
            key,
            BindingSpec::new(Recipe::async_resource(factory)).with_deps(deps),
        )
    }

    /// Merge every declared binding into the shared graph, building each
    /// binding's resolution step through the chosen strategy.
    ///
    /// A key collision without the override flag fails with a
    /// duplicate-binding error naming the key.
    pub(crate) fn apply_to<S>(
        &self,
        graph: &mut Graph<S>,
        build_step: &dyn Fn(Key, &BindingSpec) -> Result<S>,
    ) -> Result<()> {
        for (key, spec) in &self.bindings {
            if graph.contains(*key) && !spec.override_existing {
                return Err(Error::DuplicateBinding {
                    key: key.name().to_string(),
                });
            }

            let step = build_step(*key, spec)?;
            graph.insert(
                *key,
                Node {
                    step,
                    deps: spec.deps.clone(),
                    scope: self.scope,
                },
            );
        }
        Ok(())
    }
}
