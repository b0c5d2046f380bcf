//! Merged dependency graph and whole-graph validation
//!
//! The graph is built once from every registry, validated once, then shared
//! read-only by every container chain. Validation visits keys in
//! first-registration order so the first reported violation is the same on
//! every run.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::key::Key;
use crate::scope::Scope;

pub(crate) struct Node<S> {
    pub(crate) step: S,
    pub(crate) deps: Vec<Key>,
    pub(crate) scope: Scope,
}

pub(crate) struct Graph<S> {
    nodes: HashMap<Key, Node<S>>,
    order: Vec<Key>,
}

impl<S> Graph<S> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub(crate) fn contains(&self, key: Key) -> bool {
        self.nodes.contains_key(&key)
    }

    pub(crate) fn insert(&mut self, key: Key, node: Node<S>) {
        if self.nodes.insert(key, node).is_none() {
            self.order.push(key);
        }
    }

    pub(crate) fn node(&self, key: Key) -> Option<&Node<S>> {
        self.nodes.get(&key)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Validate the whole graph before any container exists.
    ///
    /// Every key is traversed depth-first, tracking the current exploration
    /// path separately from the fully-verified set. Detects cycles, missing
    /// dependencies, and dependencies bound to a strictly narrower scope
    /// than their dependent.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut verified = HashSet::new();
        let mut on_path = HashSet::new();
        let mut path = Vec::new();

        for &key in &self.order {
            self.check(key, None, &mut verified, &mut on_path, &mut path)?;
        }

        debug!(bindings = self.order.len(), "dependency graph validated");
        Ok(())
    }

    fn check(
        &self,
        key: Key,
        required_by: Option<(Key, Scope)>,
        verified: &mut HashSet<Key>,
        on_path: &mut HashSet<Key>,
        path: &mut Vec<Key>,
    ) -> Result<()> {
        if on_path.contains(&key) {
            return Err(cycle_error(path, key));
        }

        let node = match self.nodes.get(&key) {
            Some(node) => node,
            None => {
                return Err(Error::MissingDependency {
                    key: key.name().to_string(),
                })
            }
        };

        if let Some((dependent, dependent_scope)) = required_by {
            if node.scope < dependent_scope {
                return Err(Error::ScopeViolation {
                    key: dependent.name().to_string(),
                    dependency: key.name().to_string(),
                });
            }
        }

        if verified.contains(&key) {
            return Ok(());
        }

        on_path.insert(key);
        path.push(key);

        for &dep in &node.deps {
            self.check(dep, Some((key, node.scope)), verified, on_path, path)?;
        }

        on_path.remove(&key);
        path.pop();
        verified.insert(key);
        Ok(())
    }
}

/// Readable cycle chain: the path slice from the first occurrence of the
/// repeated key through the repetition, inclusive.
fn cycle_error(path: &[Key], key: Key) -> Error {
    let start = path.iter().position(|k| *k == key).unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|k| k.name().to_string()).collect();
    cycle.push(key.name().to_string());
    Error::CyclicDependency { cycle }
}
