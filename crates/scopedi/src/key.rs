//! Binding identity tokens

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity token addressing one binding.
///
/// Two keys are equal only when they are the same token; the name is carried
/// for diagnostics and error messages, never for comparison. Creating two
/// keys with the same name yields two distinct bindings.
#[derive(Clone, Copy, Debug)]
pub struct Key {
    id: u64,
    name: &'static str,
}

impl Key {
    /// Mint a fresh key with a diagnostic name
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    /// Diagnostic name of this key
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
