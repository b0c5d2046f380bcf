//! Error handling types

use std::sync::Arc;

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scoped dependency-resolution engine.
///
/// The enum is `Clone` so a settled resolution result can stay memoized in a
/// container cache and be handed to every waiter of the same key.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Malformed binding declaration
    #[error("invalid binding declaration: {message}")]
    Usage {
        /// Description of the malformed declaration
        message: String,
    },

    /// Unflagged collision on an already-registered key
    #[error("duplicate binding for key `{key}`; pass `with_override(true)` to replace it")]
    DuplicateBinding {
        /// Name of the colliding key
        key: String,
    },

    /// A referenced key is absent from the merged graph
    #[error("missing binding for key `{key}`")]
    MissingDependency {
        /// Name of the absent key
        key: String,
    },

    /// The dependency graph contains a cycle
    #[error("cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Key names along the cycle, first occurrence through the repetition
        cycle: Vec<String>,
    },

    /// A binding depends on a key bound to a strictly narrower scope
    #[error("binding `{key}` depends on `{dependency}`, which lives in a narrower scope")]
    ScopeViolation {
        /// Name of the dependent key
        key: String,
        /// Name of the offending dependency key
        dependency: String,
    },

    /// Illegal movement along the scope chain
    #[error("scope navigation error: {message}")]
    ScopeNavigation {
        /// Description of the illegal navigation
        message: String,
    },

    /// A scoped resource broke its acquire/release contract
    #[error("scoped-resource protocol violated: {message}")]
    FactoryProtocol {
        /// Description of the contract breach
        message: String,
    },

    /// A suspension-requiring recipe was registered under a synchronous container
    #[error("recipe for `{key}` requires suspension and cannot run in a synchronous container")]
    ConcurrencyCompatibility {
        /// Name of the offending key
        key: String,
    },

    /// A user recipe failed during construction
    #[error("recipe failed: {0}")]
    Recipe(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A resolved value did not downcast to the requested type
    #[error("{subject} is not a `{expected}`")]
    TypeMismatch {
        /// What was being downcast (a key or a positional dependency)
        subject: String,
        /// The requested Rust type
        expected: &'static str,
    },
}

impl Error {
    /// Create a usage error
    pub fn usage<S: Into<String>>(message: S) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create a scope-navigation error
    pub fn navigation<S: Into<String>>(message: S) -> Self {
        Self::ScopeNavigation {
            message: message.into(),
        }
    }

    /// Create a factory-protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::FactoryProtocol {
            message: message.into(),
        }
    }

    /// Wrap a construction failure raised inside a user recipe
    pub fn recipe<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Recipe(Arc::new(source))
    }
}
