//! Specialized strategy
//!
//! Synthesizes a dedicated resolution step once per binding while the graph
//! is built: recipe-kind and arity dispatch are both resolved ahead of time
//! and the emitted closure carries no per-call interpretation. Observable
//! behavior is identical to the direct strategy.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::binding::{Args, BindingSpec, Recipe};
use crate::error::{Error, Result};
use crate::key::Key;

use super::{
    async_step_from, reject_suspension, sync_step_from, AsyncLookup, AsyncStep, ResolverStrategy,
    SyncLookup, SyncStep,
};

/// Emits one pre-dispatched closure per binding at graph-build time.
pub struct SpecializedStrategy;

impl ResolverStrategy for SpecializedStrategy {
    fn sync_step(&self, key: Key, spec: &BindingSpec) -> Result<SyncStep> {
        reject_suspension(key, spec)?;

        Ok(match spec.recipe().clone() {
            Recipe::Value(value) => {
                sync_step_from(move |_lookup, _teardowns| Ok(Arc::clone(&value)))
            }
            Recipe::Factory(factory) => {
                let produce = specialize_sync_args(spec.deps());
                sync_step_from(move |lookup, _teardowns| factory(produce(lookup)?))
            }
            Recipe::Resource(factory) => {
                let produce = specialize_sync_args(spec.deps());
                sync_step_from(move |lookup, teardowns| {
                    let (value, handle) = factory(produce(lookup)?)?;
                    teardowns.push(handle);
                    Ok(value)
                })
            }
            // rejected above; kept as a defensive error
            Recipe::AsyncFactory(_) | Recipe::AsyncResource(_) => {
                return Err(Error::ConcurrencyCompatibility {
                    key: key.name().to_string(),
                })
            }
        })
    }

    fn async_step(&self, _key: Key, spec: &BindingSpec) -> Result<AsyncStep> {
        Ok(match spec.recipe().clone() {
            Recipe::Value(value) => async_step_from(move |_lookup, _teardowns| {
                let value = Arc::clone(&value);
                async move { Ok(value) }.boxed()
            }),
            Recipe::Factory(factory) => {
                let produce = specialize_async_args(spec.deps());
                async_step_from(move |lookup, _teardowns| {
                    let factory = Arc::clone(&factory);
                    let produce = Arc::clone(&produce);
                    async move { factory(produce(lookup).await?) }.boxed()
                })
            }
            Recipe::Resource(factory) => {
                let produce = specialize_async_args(spec.deps());
                async_step_from(move |lookup, teardowns| {
                    let factory = Arc::clone(&factory);
                    let produce = Arc::clone(&produce);
                    async move {
                        let (value, handle) = factory(produce(lookup).await?)?;
                        teardowns.push(handle.into());
                        Ok(value)
                    }
                    .boxed()
                })
            }
            Recipe::AsyncFactory(factory) => {
                let produce = specialize_async_args(spec.deps());
                async_step_from(move |lookup, _teardowns| {
                    let factory = Arc::clone(&factory);
                    let produce = Arc::clone(&produce);
                    async move { factory(produce(lookup).await?).await }.boxed()
                })
            }
            Recipe::AsyncResource(factory) => {
                let produce = specialize_async_args(spec.deps());
                async_step_from(move |lookup, teardowns| {
                    let factory = Arc::clone(&factory);
                    let produce = Arc::clone(&produce);
                    async move {
                        let (value, handle) = factory(produce(lookup).await?).await?;
                        teardowns.push(handle);
                        Ok(value)
                    }
                    .boxed()
                })
            }
        })
    }
}

type SyncArgsFn = Box<dyn Fn(&SyncLookup<'_>) -> Result<Args> + Send + Sync>;
type AsyncArgsFn = Arc<dyn Fn(AsyncLookup) -> BoxFuture<'static, Result<Args>> + Send + Sync>;

fn sync_args_from<F>(produce: F) -> SyncArgsFn
where
    F: Fn(&SyncLookup<'_>) -> Result<Args> + Send + Sync + 'static,
{
    Box::new(produce)
}

fn async_args_from<F>(produce: F) -> AsyncArgsFn
where
    F: Fn(AsyncLookup) -> BoxFuture<'static, Result<Args>> + Send + Sync + 'static,
{
    Arc::new(produce)
}

/// Arity ladder chosen once per binding; the general loop only backs the
/// arities past the fixed rungs.
fn specialize_sync_args(deps: &[Key]) -> SyncArgsFn {
    match deps {
        [] => sync_args_from(|_lookup| Ok(Args::new(Vec::new()))),
        &[d1] => sync_args_from(move |lookup| Ok(Args::new(vec![lookup(d1)?]))),
        &[d1, d2] => sync_args_from(move |lookup| Ok(Args::new(vec![lookup(d1)?, lookup(d2)?]))),
        &[d1, d2, d3] => sync_args_from(move |lookup| {
            Ok(Args::new(vec![lookup(d1)?, lookup(d2)?, lookup(d3)?]))
        }),
        &[d1, d2, d3, d4] => sync_args_from(move |lookup| {
            Ok(Args::new(vec![
                lookup(d1)?,
                lookup(d2)?,
                lookup(d3)?,
                lookup(d4)?,
            ]))
        }),
        _ => {
            let deps: Arc<[Key]> = Arc::from(deps);
            sync_args_from(move |lookup| {
                let mut values = Vec::with_capacity(deps.len());
                for &dep in deps.iter() {
                    values.push(lookup(dep)?);
                }
                Ok(Args::new(values))
            })
        }
    }
}

/// Suspension-capable arity ladder; dependencies still resolve one at a
/// time, in declared order.
fn specialize_async_args(deps: &[Key]) -> AsyncArgsFn {
    match deps {
        [] => async_args_from(|_lookup| async { Ok(Args::new(Vec::new())) }.boxed()),
        &[d1] => async_args_from(move |lookup| {
            async move { Ok(Args::new(vec![lookup(d1).await?])) }.boxed()
        }),
        &[d1, d2] => async_args_from(move |lookup| {
            async move { Ok(Args::new(vec![lookup(d1).await?, lookup(d2).await?])) }.boxed()
        }),
        &[d1, d2, d3] => async_args_from(move |lookup| {
            async move {
                Ok(Args::new(vec![
                    lookup(d1).await?,
                    lookup(d2).await?,
                    lookup(d3).await?,
                ]))
            }
            .boxed()
        }),
        &[d1, d2, d3, d4] => async_args_from(move |lookup| {
            async move {
                Ok(Args::new(vec![
                    lookup(d1).await?,
                    lookup(d2).await?,
                    lookup(d3).await?,
                    lookup(d4).await?,
                ]))
            }
            .boxed()
        }),
        _ => {
            let deps: Arc<[Key]> = Arc::from(deps);
            async_args_from(move |lookup| {
                let deps = Arc::clone(&deps);
                async move {
                    let mut values = Vec::with_capacity(deps.len());
                    for &dep in deps.iter() {
                        values.push(lookup(dep).await?);
                    }
                    Ok(Args::new(values))
                }
                .boxed()
            })
        }
    }
}
