//! Binding records and construction recipes
//!
//! A binding is declared as one explicit record: the dependency key list, a
//! tagged construction recipe, and an override flag. The recipe variant is
//! chosen at registration time, so the engine never inspects a callable at
//! runtime to learn what it produces.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::teardown::{AsyncTeardown, Teardown};

/// An erased, resolved value as stored in a container cache.
///
/// Caching hands out clones of the same `Arc`, so instance identity is
/// observable through [`Arc::ptr_eq`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erased synchronous factory
pub type SyncFactoryFn = Arc<dyn Fn(Args) -> Result<Instance> + Send + Sync>;
/// Erased synchronous scoped-resource factory
pub type SyncResourceFn = Arc<dyn Fn(Args) -> Result<(Instance, Teardown)> + Send + Sync>;
/// Erased suspension-requiring factory
pub type AsyncFactoryFn = Arc<dyn Fn(Args) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;
/// Erased suspension-requiring scoped-resource factory
pub type AsyncResourceFn =
    Arc<dyn Fn(Args) -> BoxFuture<'static, Result<(Instance, AsyncTeardown)>> + Send + Sync>;

/// Positional, already-resolved dependency values for one recipe invocation.
///
/// Values arrive in the binding's declared dependency order.
#[derive(Clone)]
pub struct Args(Vec<Instance>);

impl Args {
    pub(crate) fn new(values: Vec<Instance>) -> Self {
        Self(values)
    }

    /// Number of resolved dependencies
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the binding declared no dependencies
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed access to the dependency at `index` in declared order
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.0.get(index).ok_or_else(|| {
            Error::usage(format!(
                "recipe requested positional dependency {index} but only {} were declared",
                self.0.len()
            ))
        })?;
        Arc::clone(value).downcast::<T>().map_err(|_| Error::TypeMismatch {
            subject: format!("positional dependency {index}"),
            expected: std::any::type_name::<T>(),
        })
    }
}

/// How a binding constructs its value.
///
/// The variant doubles as the capability classification of the recipe: a
/// container picks its resolution path from the tag alone.
#[derive(Clone)]
pub enum Recipe {
    /// A prebuilt instance; resolution returns it without construction
    Value(Instance),
    /// Plain synchronous factory over the resolved dependencies
    Factory(SyncFactoryFn),
    /// Synchronous scoped-resource factory yielding a value and its teardown
    Resource(SyncResourceFn),
    /// Suspension-requiring factory
    AsyncFactory(AsyncFactoryFn),
    /// Suspension-requiring scoped-resource factory
    AsyncResource(AsyncResourceFn),
}

/// Capability classification of a [`Recipe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeKind {
    /// Yields a plain value directly
    Value,
    /// Constructs a plain value synchronously
    Factory,
    /// Represents a scoped resource
    Resource,
    /// Requires suspension to construct
    AsyncFactory,
    /// Requires suspension and represents a scoped resource
    AsyncResource,
}

impl Recipe {
    /// Wrap a prebuilt value
    pub fn value<T>(value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::Value(Arc::new(value))
    }

    /// Wrap a typed synchronous factory
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move |args| {
            Ok(Arc::new(factory(args)?) as Instance)
        }))
    }

    /// Wrap a typed synchronous scoped-resource factory.
    ///
    /// The factory returns the acquired value together with its release
    /// action; the engine registers the release in the resolving container's
    /// teardown list.
    pub fn resource<T, F, R>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Result<(T, R)> + Send + Sync + 'static,
        R: FnOnce() -> Result<()> + Send + 'static,
    {
        Self::Resource(Arc::new(move |args| {
            let (value, release) = factory(args)?;
            Ok((Arc::new(value) as Instance, Teardown::new(release)))
        }))
    }

    /// Wrap a typed suspension-requiring factory
    pub fn async_factory<T, F, Fut>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::AsyncFactory(Arc::new(move |args| {
            let constructing = factory(args);
            async move { Ok(Arc::new(constructing.await?) as Instance) }.boxed()
        }))
    }

    /// Wrap a typed suspension-requiring scoped-resource factory
    pub fn async_resource<T, F, Fut, R, RFut>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(T, R)>> + Send + 'static,
        R: FnOnce() -> RFut + Send + 'static,
        RFut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::AsyncResource(Arc::new(move |args| {
            let acquiring = factory(args);
            async move {
                let (value, release) = acquiring.await?;
                Ok((Arc::new(value) as Instance, AsyncTeardown::new(release)))
            }
            .boxed()
        }))
    }

    /// Capability classification of this recipe
    pub fn kind(&self) -> RecipeKind {
        match self {
            Recipe::Value(_) => RecipeKind::Value,
            Recipe::Factory(_) => RecipeKind::Factory,
            Recipe::Resource(_) => RecipeKind::Resource,
            Recipe::AsyncFactory(_) => RecipeKind::AsyncFactory,
            Recipe::AsyncResource(_) => RecipeKind::AsyncResource,
        }
    }

    /// Whether resolution of this recipe may suspend
    pub fn requires_suspension(&self) -> bool {
        matches!(
            self.kind(),
            RecipeKind::AsyncFactory | RecipeKind::AsyncResource
        )
    }

    /// Whether this recipe pairs its value with a teardown action
    pub fn is_resource(&self) -> bool {
        matches!(
            self.kind(),
            RecipeKind::Resource | RecipeKind::AsyncResource
        )
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recipe::{:?}", self.kind())
    }
}

/// One normalized binding declaration: dependency keys, recipe, options.
#[derive(Clone, Debug)]
pub struct BindingSpec {
    pub(crate) deps: Vec<Key>,
    pub(crate) recipe: Recipe,
    pub(crate) override_existing: bool,
}

impl BindingSpec {
    /// Declare a binding with the given recipe, no dependencies, no options
    pub fn new(recipe: Recipe) -> Self {
        Self {
            deps: Vec::new(),
            recipe,
            override_existing: false,
        }
    }

    /// Declare the dependency keys, in the order the recipe receives them
    pub fn with_deps<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Key>,
    {
        self.deps = deps.into_iter().collect();
        self
    }

    /// Allow this binding to replace an already-registered one for the same key
    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Declared dependency keys
    pub fn deps(&self) -> &[Key] {
        &self.deps
    }

    /// Construction recipe
    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if matches!(self.recipe, Recipe::Value(_)) && !self.deps.is_empty() {
            return Err(Error::usage(
                "a value recipe cannot declare dependencies",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_downcast_to_the_declared_type() {
        let args = Args::new(vec![Arc::new(7_u32) as Instance]);
        let value: Arc<u32> = args.get(0).unwrap();
        assert_eq!(*value, 7);
    }

    #[test]
    fn args_reject_a_wrong_type() {
        let args = Args::new(vec![Arc::new(7_u32) as Instance]);
        let result = args.get::<String>(0);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn args_reject_an_out_of_range_index() {
        let args = Args::new(Vec::new());
        assert!(matches!(args.get::<u32>(0), Err(Error::Usage { .. })));
    }

    #[test]
    fn recipes_classify_themselves() {
        let value = Recipe::value(1_u8);
        assert_eq!(value.kind(), RecipeKind::Value);
        assert!(!value.requires_suspension());

        let factory = Recipe::factory(|_| Ok(1_u8));
        assert_eq!(factory.kind(), RecipeKind::Factory);

        let resource = Recipe::resource(|_| Ok((1_u8, || Ok(()))));
        assert!(resource.is_resource());
        assert!(!resource.requires_suspension());

        let suspended = Recipe::async_factory(|_| async { Ok(1_u8) });
        assert!(suspended.requires_suspension());
    }

    #[test]
    fn a_value_recipe_with_dependencies_is_malformed() {
        let spec = BindingSpec::new(Recipe::value(1_u8)).with_deps([Key::new("dep")]);
        assert!(matches!(spec.validate(), Err(Error::Usage { .. })));
    }
}
