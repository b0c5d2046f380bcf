//! # scopedi
//!
//! Scoped dependency-resolution engine: declarative bindings, whole-graph
//! validation, scope-chained containers, and deterministic LIFO teardown of
//! acquired resources.
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`provider`] | Per-scope binding registries |
//! | [`binding`] | Binding records, tagged construction recipes |
//! | [`resolver`] | Pluggable strategies turning recipes into resolution steps |
//! | [`container`] | Synchronous scope-chain container |
//! | [`async_container`] | Suspension-capable scope-chain container |
//! | [`bootstrap`] | Composition root: graph merge, validation, root container |
//! | [`teardown`] | Run-exactly-once release handles |
//! | [`error`] | Error taxonomy |
//!
//! The dependency graph is merged from every registry and validated once,
//! before any container exists: missing dependencies, cycles, scope
//! violations, and unflagged duplicates all fail the build. Afterwards the
//! graph is immutable and shared read-only by every container chain.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use scopedi::{build_container, Key, Provider, Scope, StrategyMode};
//!
//! struct Database;
//! struct Repository {
//!     db: Arc<Database>,
//! }
//!
//! # fn main() -> scopedi::Result<()> {
//! let database = Key::new("database");
//! let repository = Key::new("repository");
//!
//! let mut provider = Provider::new(Scope::App);
//! provider.provide_factory(database, [], |_| Ok(Database))?;
//! provider.provide_factory(repository, [database], |args| {
//!     Ok(Repository { db: args.get(0)? })
//! })?;
//!
//! let app = build_container(Scope::App, &[provider], StrategyMode::Direct)?;
//! let repo: Arc<Repository> = app.get_as(repository)?;
//! let again: Arc<Repository> = app.get_as(repository)?;
//! assert!(Arc::ptr_eq(&repo, &again));
//! # app.close()?;
//! # Ok(())
//! # }
//! ```

/// Suspension-capable scope container
pub mod async_container;
/// Binding records and construction recipes
pub mod binding;
/// Composition root
pub mod bootstrap;
/// Synchronous scope container
pub mod container;
/// Error taxonomy
pub mod error;
/// Binding identity tokens
pub mod key;
/// Per-scope binding registries
pub mod provider;
/// Pluggable resolver strategies
pub mod resolver;
/// Scope levels
pub mod scope;
/// Teardown handles and lists
pub mod teardown;

mod graph;

// Re-export the working surface for convenience
pub use async_container::AsyncContainer;
pub use binding::{Args, BindingSpec, Instance, Recipe, RecipeKind};
pub use bootstrap::{build_async_container, build_container};
pub use container::Container;
pub use error::{Error, Result};
pub use key::Key;
pub use provider::Provider;
pub use resolver::{
    AsyncLookup, AsyncStep, DirectStrategy, ResolverStrategy, SpecializedStrategy, StrategyMode,
    SyncLookup, SyncStep,
};
pub use scope::Scope;
pub use teardown::{AsyncTeardown, AsyncTeardowns, Teardown, Teardowns};
