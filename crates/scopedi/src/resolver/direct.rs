//! Direct-composition strategy
//!
//! Builds every resolution step out of one generic closure that interprets
//! the binding on each call: classify the recipe, resolve the declared
//! dependencies through the lookup, invoke. Dependency resolution has fixed
//! fast paths for small arities and a general loop above that.

use std::sync::Arc;

use futures::FutureExt;

use crate::binding::{Args, BindingSpec, Recipe};
use crate::error::{Error, Result};
use crate::key::Key;

use super::{
    async_step_from, reject_suspension, sync_step_from, AsyncLookup, AsyncStep, ResolverStrategy,
    SyncLookup, SyncStep,
};

/// Interprets each binding at call time through ordinary closure composition.
pub struct DirectStrategy;

impl ResolverStrategy for DirectStrategy {
    fn sync_step(&self, key: Key, spec: &BindingSpec) -> Result<SyncStep> {
        reject_suspension(key, spec)?;
        let recipe = spec.recipe().clone();
        let deps: Arc<[Key]> = Arc::from(spec.deps());

        Ok(sync_step_from(move |lookup, teardowns| match &recipe {
            Recipe::Value(value) => Ok(Arc::clone(value)),
            Recipe::Factory(factory) => factory(resolve_sync_args(lookup, &deps)?),
            Recipe::Resource(factory) => {
                let (value, handle) = factory(resolve_sync_args(lookup, &deps)?)?;
                teardowns.push(handle);
                Ok(value)
            }
            // rejected at build time; kept as a defensive error
            Recipe::AsyncFactory(_) | Recipe::AsyncResource(_) => {
                Err(Error::ConcurrencyCompatibility {
                    key: key.name().to_string(),
                })
            }
        }))
    }

    fn async_step(&self, _key: Key, spec: &BindingSpec) -> Result<AsyncStep> {
        let recipe = spec.recipe().clone();
        let deps: Arc<[Key]> = Arc::from(spec.deps());

        Ok(async_step_from(move |lookup, teardowns| {
            let recipe = recipe.clone();
            let deps = Arc::clone(&deps);
            async move {
                match &recipe {
                    Recipe::Value(value) => Ok(Arc::clone(value)),
                    Recipe::Factory(factory) => {
                        let args = resolve_async_args(&lookup, &deps).await?;
                        factory(args)
                    }
                    Recipe::Resource(factory) => {
                        let args = resolve_async_args(&lookup, &deps).await?;
                        let (value, handle) = factory(args)?;
                        teardowns.push(handle.into());
                        Ok(value)
                    }
                    Recipe::AsyncFactory(factory) => {
                        let args = resolve_async_args(&lookup, &deps).await?;
                        factory(args).await
                    }
                    Recipe::AsyncResource(factory) => {
                        let args = resolve_async_args(&lookup, &deps).await?;
                        let (value, handle) = factory(args).await?;
                        teardowns.push(handle);
                        Ok(value)
                    }
                }
            }
            .boxed()
        }))
    }
}

fn resolve_sync_args(lookup: &SyncLookup<'_>, deps: &[Key]) -> Result<Args> {
    let values = match deps {
        [] => Vec::new(),
        &[d1] => vec![lookup(d1)?],
        &[d1, d2] => vec![lookup(d1)?, lookup(d2)?],
        &[d1, d2, d3] => vec![lookup(d1)?, lookup(d2)?, lookup(d3)?],
        &[d1, d2, d3, d4] => vec![lookup(d1)?, lookup(d2)?, lookup(d3)?, lookup(d4)?],
        _ => {
            let mut values = Vec::with_capacity(deps.len());
            for &dep in deps {
                values.push(lookup(dep)?);
            }
            values
        }
    };
    Ok(Args::new(values))
}

/// Dependencies resolve one at a time, in declared order; construction side
/// effects stay deterministic.
async fn resolve_async_args(lookup: &AsyncLookup, deps: &[Key]) -> Result<Args> {
    let values = match deps {
        [] => Vec::new(),
        &[d1] => vec![lookup(d1).await?],
        &[d1, d2] => vec![lookup(d1).await?, lookup(d2).await?],
        &[d1, d2, d3] => vec![lookup(d1).await?, lookup(d2).await?, lookup(d3).await?],
        &[d1, d2, d3, d4] => vec![
            lookup(d1).await?,
            lookup(d2).await?,
            lookup(d3).await?,
            lookup(d4).await?,
        ],
        _ => {
            let mut values = Vec::with_capacity(deps.len());
            for &dep in deps {
                values.push(lookup(dep).await?);
            }
            values
        }
    };
    Ok(Args::new(values))
}
