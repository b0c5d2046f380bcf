//! Pluggable resolver strategies
//!
//! A strategy turns one binding into a resolution step of uniform shape:
//! given a lookup into the resolving container and that container's teardown
//! list, produce the value (or its future). The two shipped strategies are
//! drop-in substitutes for each other: same argument order, same errors,
//! same teardown registration.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::binding::{BindingSpec, Instance};
use crate::error::{Error, Result};
use crate::key::Key;
use crate::teardown::{AsyncTeardowns, Teardowns};

mod direct;
mod specialized;

pub use direct::DirectStrategy;
pub use specialized::SpecializedStrategy;

/// Lookup into the resolving container, used for transitive dependencies
pub type SyncLookup<'a> = dyn Fn(Key) -> Result<Instance> + 'a;

/// One synchronous resolution step
pub type SyncStep = Arc<dyn Fn(&SyncLookup<'_>, &Teardowns) -> Result<Instance> + Send + Sync>;

/// Suspension-capable lookup into the resolving container
pub type AsyncLookup = Arc<dyn Fn(Key) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;

/// One suspension-capable resolution step
pub type AsyncStep = Arc<
    dyn Fn(AsyncLookup, Arc<AsyncTeardowns>) -> BoxFuture<'static, Result<Instance>> + Send + Sync,
>;

/// Strategy seam: builds resolution steps for both container variants.
///
/// The synchronous builder must reject suspension-requiring recipes at
/// graph-build time, never at call time.
pub trait ResolverStrategy: Send + Sync {
    /// Build the synchronous resolution step for one binding
    fn sync_step(&self, key: Key, spec: &BindingSpec) -> Result<SyncStep>;

    /// Build the suspension-capable resolution step for one binding
    fn async_step(&self, key: Key, spec: &BindingSpec) -> Result<AsyncStep>;
}

/// Which resolver strategy a container factory wires in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyMode {
    /// Ordinary closure composition, recipe interpreted per call
    #[default]
    Direct,
    /// Per-binding step synthesized once at graph-build time
    Specialized,
}

impl StrategyMode {
    pub(crate) fn strategy(self) -> &'static dyn ResolverStrategy {
        match self {
            StrategyMode::Direct => &DirectStrategy,
            StrategyMode::Specialized => &SpecializedStrategy,
        }
    }
}

pub(crate) fn sync_step_from<F>(step: F) -> SyncStep
where
    F: Fn(&SyncLookup<'_>, &Teardowns) -> Result<Instance> + Send + Sync + 'static,
{
    Arc::new(step)
}

pub(crate) fn async_step_from<F>(step: F) -> AsyncStep
where
    F: Fn(AsyncLookup, Arc<AsyncTeardowns>) -> BoxFuture<'static, Result<Instance>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(step)
}

/// A synchronous container cannot host a suspension-requiring recipe; the
/// incompatibility surfaces while the graph is built.
pub(crate) fn reject_suspension(key: Key, spec: &BindingSpec) -> Result<()> {
    if spec.recipe().requires_suspension() {
        return Err(Error::ConcurrencyCompatibility {
            key: key.name().to_string(),
        });
    }
    Ok(())
}
