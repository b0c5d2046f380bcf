//! Suspension-capable scope container
//!
//! Same container protocol as the synchronous variant, for recipes that may
//! suspend at any dependency lookup, nested action, or teardown. The pending
//! resolution of a key is memoized immediately as a shared future, so
//! concurrent or re-entrant requests observe exactly one invocation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::{debug, error, trace};

use crate::binding::Instance;
use crate::container::settle_scope;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::key::Key;
use crate::resolver::{AsyncLookup, AsyncStep};
use crate::scope::Scope;
use crate::teardown::AsyncTeardowns;

type SharedResolution = Shared<BoxFuture<'static, Result<Instance>>>;

enum CacheSlot {
    Pending(SharedResolution),
    Settled(Result<Instance>),
}

/// Suspension-capable resolution context for one scope level.
///
/// Cheap to clone; clones share the same cache and teardown list.
#[derive(Clone)]
pub struct AsyncContainer {
    inner: Arc<AsyncInner>,
}

struct AsyncInner {
    scope: Scope,
    graph: Arc<Graph<AsyncStep>>,
    parent: Option<AsyncContainer>,
    cache: Mutex<HashMap<Key, CacheSlot>>,
    teardowns: Arc<AsyncTeardowns>,
}

impl AsyncContainer {
    pub(crate) fn root(scope: Scope, graph: Arc<Graph<AsyncStep>>) -> Self {
        Self::with_parent(scope, graph, None)
    }

    fn with_parent(
        scope: Scope,
        graph: Arc<Graph<AsyncStep>>,
        parent: Option<AsyncContainer>,
    ) -> Self {
        Self {
            inner: Arc::new(AsyncInner {
                scope,
                graph,
                parent,
                cache: Mutex::new(HashMap::new()),
                teardowns: Arc::new(AsyncTeardowns::default()),
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
    /// container a key resolves at most once; callers racing in before the
    /// first resolution settles await the same in-flight future.
    pub async fn get(&self, key: Key) -> Result<Instance> {
        self.get_future(key).await
    }

    /// Resolve `key` and downcast the instance to `T`
    pub async fn get_as<T>(&self, key: Key) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(key).await?.downcast::<T>().map_err(|_| Error::TypeMismatch {
            subject: format!("key `{key}`"),
            expected: std::any::type_name::<T>(),
        })
    }

    fn get_future(&self, key: Key) -> BoxFuture<'static, Result<Instance>> {
        let this = self.clone();
        async move { this.resolve(key).await }.boxed()
    }

    async fn resolve(&self, key: Key) -> Result<Instance> {
        let node = match self.inner.graph.node(key) {
            Some(node) => node,
            None => {
                return Err(Error::MissingDependency {
                    key: key.name().to_string(),
                })
            }
        };

        if node.scope != self.inner.scope {
            return match &self.inner.parent {
                Some(parent) => parent.get_future(key).await,
                None => Err(Error::navigation(format!(
                    "cannot resolve `{key}` outside of its scope"
                ))),
            };
        }

        let shared = {
            let mut cache = lock(&self.inner.cache);
            match cache.get(&key) {
                Some(CacheSlot::Settled(settled)) => return settled.clone(),
                Some(CacheSlot::Pending(pending)) => pending.clone(),
                None => {
                    trace!(%key, scope = %self.inner.scope, "resolving");
                    let step = Arc::clone(&node.step);
                    let pending = step(self.lookup(), Arc::clone(&self.inner.teardowns)).shared();
                    cache.insert(key, CacheSlot::Pending(pending.clone()));
                    pending
                }
            }
        };

        let settled = shared.await;
        lock(&self.inner.cache).insert(key, CacheSlot::Settled(settled.clone()));
        settled
    }

    fn lookup(&self) -> AsyncLookup {
        let this = self.clone();
        Arc::new(move |key| this.get_future(key))
    }

    /// Release everything this container acquired, then clear its cache.
    ///
    /// Teardown handles run in strict reverse-registration order, each
    /// exactly once. Every handle in the batch is attempted; the first
    /// failure propagates after the batch, later failures are logged. A
    /// closed container must not be reused.
    pub async fn close(&self) -> Result<()> {
        let mut handles = self.inner.teardowns.drain();
        let mut first_error = None;

        for handle in handles.iter_mut().rev() {
            if let Err(failure) = handle.run().await {
                if first_error.is_none() {
                    first_error = Some(failure);
                } else {
                    error!(error = %failure, "additional teardown failure");
                }
            }
        }

        lock(&self.inner.cache).clear();
        debug!(scope = %self.inner.scope, released = handles.len(), "container closed");

        match first_error {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }

    /// Run `action` one scope level narrower than this container.
    pub async fn with_nested_scope<F, Fut, R>(&self, action: F) -> Result<R>
    where
        F: FnOnce(AsyncContainer) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let target = self.inner.scope.narrower().ok_or_else(|| {
            Error::navigation(format!("no scope narrower than {}", self.inner.scope))
        })?;
        self.with_nested_scope_at(target, action).await
    }

    /// Run `action` at `target`, descending as many levels as needed.
    ///
    /// Equal to the current scope: the action runs against this container
    /// and nothing is created or closed. Narrower by several levels: one
    /// intermediate container per level, every one closed in reverse
    /// creation order once the action's future settles, success or failure.
    pub async fn with_nested_scope_at<F, Fut, R>(&self, target: Scope, action: F) -> Result<R>
    where
        F: FnOnce(AsyncContainer) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        if target == self.inner.scope {
            return action(self.clone()).await;
        }

        let chain = self.descend(target)?;
        let innermost = chain
            .last()
            .cloned()
            .ok_or_else(|| Error::navigation("no nested container was created"))?;

        let result = action(innermost).await;
        let closed = close_chain(&chain).await;
        settle_scope(result, closed)
    }

    fn descend(&self, target: Scope) -> Result<Vec<AsyncContainer>> {
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

async fn close_chain(chain: &[AsyncContainer]) -> Result<()> {
    let mut first_error = None;
    for container in chain.iter().rev() {
        if let Err(failure) = container.close().await {
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

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
