//! Teardown handles and per-container teardown lists
//!
//! A scoped resource is an acquired value paired with a release action. The
//! handle types here enforce the release contract: the action runs exactly
//! once, and resuming a spent handle is a protocol violation. Containers
//! collect handles in acquisition order and release them in reverse.

use std::cell::RefCell;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::{Error, Result};

type ReleaseFn = Box<dyn FnOnce() -> Result<()> + Send>;
type AsyncReleaseFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Handle for a resource that has been acquired but not yet released.
pub struct Teardown {
    release: Option<ReleaseFn>,
}

impl Teardown {
    /// Wrap a release action into a run-exactly-once handle
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Run the release action.
    ///
    /// Errors with a factory-protocol violation when the handle was already
    /// resumed once.
    pub fn run(&mut self) -> Result<()> {
        match self.release.take() {
            Some(release) => release(),
            None => Err(Error::protocol(
                "teardown handle was resumed a second time",
            )),
        }
    }

    /// Whether the release action already ran
    pub fn is_spent(&self) -> bool {
        self.release.is_none()
    }
}

/// Suspension-capable counterpart of [`Teardown`].
pub struct AsyncTeardown {
    release: Option<AsyncReleaseFn>,
}

impl AsyncTeardown {
    /// Wrap an asynchronous release action into a run-exactly-once handle
    pub fn new<F, Fut>(release: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            release: Some(Box::new(move || release().boxed())),
        }
    }

    /// Run the release action, suspending as it requires.
    pub async fn run(&mut self) -> Result<()> {
        match self.release.take() {
            Some(release) => release().await,
            None => Err(Error::protocol(
                "teardown handle was resumed a second time",
            )),
        }
    }

    /// Whether the release action already ran
    pub fn is_spent(&self) -> bool {
        self.release.is_none()
    }
}

impl From<Teardown> for AsyncTeardown {
    fn from(handle: Teardown) -> Self {
        Self::new(move || {
            let mut handle = handle;
            async move { handle.run() }
        })
    }
}

/// Ordered teardown list owned by one synchronous container.
#[derive(Default)]
pub struct Teardowns {
    items: RefCell<Vec<Teardown>>,
}

impl Teardowns {
    /// Register a handle; registration order is the acquisition order
    pub fn push(&self, handle: Teardown) {
        self.items.borrow_mut().push(handle);
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Whether no handle is registered
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub(crate) fn drain(&self) -> Vec<Teardown> {
        self.items.take()
    }
}

/// Ordered teardown list owned by one suspension-capable container.
#[derive(Default)]
pub struct AsyncTeardowns {
    items: Mutex<Vec<AsyncTeardown>>,
}

impl AsyncTeardowns {
    /// Register a handle; registration order is the acquisition order
    pub fn push(&self, handle: AsyncTeardown) {
        self.lock().push(handle);
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no handle is registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn drain(&self) -> Vec<AsyncTeardown> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AsyncTeardown>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
