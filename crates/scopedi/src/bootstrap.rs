//! Container bootstrap - composition root
//!
//! Wires registries, a resolver strategy, and a concurrency variant into a
//! validated dependency graph and its root container. Validation runs here,
//! eagerly: no container is ever returned for a graph with a missing
//! dependency, a cycle, a scope violation, or an unflagged duplicate.

use std::sync::Arc;

use tracing::debug;

use crate::async_container::AsyncContainer;
use crate::container::Container;
use crate::error::Result;
use crate::graph::Graph;
use crate::provider::Provider;
use crate::resolver::StrategyMode;
use crate::scope::Scope;

/// Build a synchronous root container at `root_scope`.
///
/// Registries merge in order, so override-flagged bindings in a later
/// registry replace earlier ones. Suspension-requiring recipes are rejected
/// here, while the graph is built.
pub fn build_container(
    root_scope: Scope,
    providers: &[Provider],
    mode: StrategyMode,
) -> Result<Container> {
    let strategy = mode.strategy();

    let mut graph = Graph::new();
    for provider in providers {
        provider.apply_to(&mut graph, &|key, spec| strategy.sync_step(key, spec))?;
    }
    graph.validate()?;

    debug!(
        scope = %root_scope,
        bindings = graph.len(),
        strategy = ?mode,
        "built synchronous container"
    );
    Ok(Container::root(root_scope, Arc::new(graph)))
}

/// Build a suspension-capable root container at `root_scope`.
pub fn build_async_container(
    root_scope: Scope,
    providers: &[Provider],
    mode: StrategyMode,
) -> Result<AsyncContainer> {
    let strategy = mode.strategy();

    let mut graph = Graph::new();
    for provider in providers {
        provider.apply_to(&mut graph, &|key, spec| strategy.async_step(key, spec))?;
    }
    graph.validate()?;

    debug!(
        scope = %root_scope,
        bindings = graph.len(),
        strategy = ?mode,
        "built suspension-capable container"
    );
    Ok(AsyncContainer::root(root_scope, Arc::new(graph)))
}
