//! Synchronous scope container
//!
//! The resolution context for one scope level: an exclusive instance cache,
//! an ordered teardown list, and a link to the parent container at the next
//! wider scope. Containers form a chain from the root down; resolution
//! delegates upward when a key is bound wider than the current level.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::Either;
use tracing::{debug, error, trace};

use crate::binding::Instance;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::key::Key;
use crate::resolver::SyncStep;
use crate::scope::Scope;
use crate::teardown::Teardowns;

/// Synchronous resolution context for one scope level.
///
/// Cheap to clone; clones share the same cache and teardown list. The
/// validated graph is shared read-only across every container chain built
/// from it.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

struct ContainerInner {
    scope: Scope,
    graph: Arc<Graph<SyncStep>>,
    parent: Option<Container>,
    cache: RefCell<HashMap<Key, Instance>>,
    teardowns: Teardowns,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.inner.scope)
            .field("cached", &self.inner.cache.borrow().len())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

impl Container {
    pub(crate) fn root(scope: Scope, graph: Arc<Graph<SyncStep>>) -> Self {
        Self::with_parent(scope, graph, None)
    }

    fn with_parent(scope: Scope, graph: Arc<Graph<SyncStep>>, parent: Option<Container>) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                scope,
                graph,
                parent,
                cache: RefCell::new(HashMap::new()),
                teardowns: Teardowns::default(),
            }),
        }
    }

    fn child(&self, scope: Scope) -> Self {
        Self::with_parent(
            scope,
            Arc::clone(&self.inner.graph),
            Some(self.clone()),
        )
    }

    /// Scope level of this container
    pub fn scope(&self) -> Scope {
        self.inner.scope
    }

    /// Resolve the value bound to `key`, constructing it on first use.
    ///
    /// Keys bound to a wider scope delegate to the parent chain. Within one
    /// container a key resolves at most once; later calls return the cached
    /// instance without re-invoking its recipe.
    pub fn get(&self, key: Key) -> Result<Instance> {
        let node = self.inner.graph.node(key).ok_or_else(|| Error::MissingDependency {
            key: key.name().to_string(),
        })?;

        if node.scope != self.inner.scope {
            return match &self.inner.parent {
                Some(parent) => parent.get(key),
                // validation guarantees reachability, unless the chain's
                // root itself is narrower than the binding
                None => Err(Error::navigation(format!(
                    "cannot resolve `{key}` outside of its scope"
                ))),
            };
        }

        if let Some(cached) = self.inner.cache.borrow().get(&key) {
            return Ok(Arc::clone(cached));
        }

        trace!(%key, scope = %self.inner.scope, "resolving");
        let step = Arc::clone(&node.step);
        let lookup = |dep: Key| self.get(dep);
        let value = step(&lookup, &self.inner.teardowns)?;
        self.inner
            .cache
            .borrow_mut()
            .insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Resolve `key` and downcast the instance to `T`
    pub fn get_as<T>(&self, key: Key) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(key)?.downcast::<T>().map_err(|_| Error::TypeMismatch {
            subject: format!("key `{key}`"),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Release everything this container acquired, then clear its cache.
    ///
    /// Teardown handles run in strict reverse-registration order, each
    /// exactly once. Every handle in the batch is attempted; the first
    /// failure propagates after the batch, later failures are logged. A
    /// closed container must not be reused.
    pub fn close(&self) -> Result<()> {
        let mut handles = self.inner.teardowns.drain();
        let mut first_error = None;

        for handle in handles.iter_mut().rev() {
            if let Err(failure) = handle.run() {
                if first_error.is_none() {
                    first_error = Some(failure);
                } else {
                    error!(error = %failure, "additional teardown failure");
                }
            }
        }

        self.inner.cache.borrow_mut().clear();
        debug!(scope = %self.inner.scope, released = handles.len(), "container closed");

        match first_error {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }

    /// Run `action` one scope level narrower than this container.
    pub fn with_nested_scope<F, R>(&self, action: F) -> Result<R>
    where
        F: FnOnce(&Container) -> Result<R>,
    {
        let target = self.inner.scope.narrower().ok_or_else(|| {
            Error::navigation(format!("no scope narrower than {}", self.inner.scope))
        })?;
        self.with_nested_scope_at(target, action)
    }

    /// Run `action` at `target`, descending as many levels as needed.
    ///
    /// Equal to the current scope: the action runs against this container
    /// and nothing is created or closed. Narrower by several levels: one
    /// intermediate container per level, every one closed in reverse
    /// creation order once the action settles, success or failure.
    pub fn with_nested_scope_at<F, R>(&self, target: Scope, action: F) -> Result<R>
    where
        F: FnOnce(&Container) -> Result<R>,
    {
        if target == self.inner.scope {
            return action(self);
        }

        let chain = self.descend(target)?;
        let innermost = chain
            .last()
            .ok_or_else(|| Error::navigation("no nested container was created"))?;

        let result = action(innermost);
        let closed = close_chain(&chain);
        settle_scope(result, closed)
    }

    /// Run a deferred `action` at `target`: the returned future settles the
    /// nested result and only then closes every container created for it,
    /// instead of blocking the caller.
    pub fn with_nested_scope_deferred<F, Fut, R>(
        &self,
        target: Scope,
        action: F,
    ) -> Result<impl Future<Output = Result<R>>>
    where
        F: FnOnce(Container) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        if target == self.inner.scope {
            return Ok(Either::Left(action(self.clone())));
        }

        let chain = self.descend(target)?;
        let innermost = chain
            .last()
            .cloned()
            .ok_or_else(|| Error::navigation("no nested container was created"))?;

        let pending = action(innermost);
        Ok(Either::Right(async move {
            let result = pending.await;
            let closed = close_chain(&chain);
            settle_scope(result, closed)
        }))
    }

    /// One container per level from just below the current scope down to
    /// `target`, in creation order.
    fn descend(&self, target: Scope) -> Result<Vec<Container>> {
        if target > self.inner.scope {
            return Err(Error::navigation(format!(
                "cannot enter wider scope {target} from {}",
                self.inner.scope
            )));
        }

        let mut chain = Vec::new();
        let mut current = self.clone();
        while current.inner.scope > target {
            let next = current.inner.scope.narrower().ok_or_else(|| {
                Error::navigation(format!("no scope narrower than {}", current.inner.scope))
            })?;
            let nested = current.child(next);
            trace!(scope = %next, "entered nested scope");
            chain.push(nested.clone());
            current = nested;
        }
        Ok(chain)
    }
}

pub(crate) fn settle_scope<R>(result: Result<R>, closed: Result<()>) -> Result<R> {
    match result {
        Ok(value) => closed.map(|()| value),
        Err(failure) => {
            if let Err(close_failure) = closed {
                error!(error = %close_failure, "teardown failed while unwinding a failed scope");
            }
            Err(failure)
        }
    }
}

fn close_chain(chain: &[Container]) -> Result<()> {
    let mut first_error = None;
    for container in chain.iter().rev() {
        if let Err(failure) = container.close() {
            if first_error.is_none() {
                first_error = Some(failure);
            } else {
                error!(error = %failure, "additional teardown failure while unwinding scopes");
            }
        }
    }
    match first_error {
        None => Ok(()),
        Some(failure) => Err(failure),
    }
}
