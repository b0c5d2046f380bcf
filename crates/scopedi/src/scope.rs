//! Scope levels
//!
//! A fixed, totally ordered set of lifetime levels, widest to narrowest:
//! `App > Request > Action > Step`. Nesting only narrows, never widens.

use std::fmt;

/// Lifetime scope of a binding or a container.
///
/// The discriminants form a monotonically decreasing ordinal from the widest
/// scope down, so the derived ordering makes a wider scope compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Scope {
    /// Narrowest level, one step of an action
    Step = 1,
    /// One action within a request
    Action = 2,
    /// One request
    Request = 3,
    /// Widest level, the whole application
    App = 4,
}

impl Scope {
    /// Ordinal of this scope level (wider is greater)
    pub const fn level(self) -> u8 {
        self as u8
    }

    /// The next narrower scope, or `None` at the narrowest level
    pub fn narrower(self) -> Option<Scope> {
        match self {
            Scope::App => Some(Scope::Request),
            Scope::Request => Some(Scope::Action),
            Scope::Action => Some(Scope::Step),
            Scope::Step => None,
        }
    }

    /// Whether this scope outlives `other`
    pub fn is_wider_than(self, other: Scope) -> bool {
        self > other
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::App => "APP",
            Scope::Request => "REQUEST",
            Scope::Action => "ACTION",
            Scope::Step => "STEP",
        };
        f.write_str(name)
    }
}
