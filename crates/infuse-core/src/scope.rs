//! Lifetime scopes
//!
//! A [`Scope`] is the lifetime tier a provider's values live in, ordered
//! broad to narrow: `Application` ⊃ `Thread` ⊃ `Task`. `Factory` sits
//! outside the ordering: a factory-scoped value nests inside whichever
//! scope instance requested it and is never a dependency of a non-factory
//! provider.
//!
//! A provider either declares its scope explicitly or leaves it to
//! inference ([`ScopeHint::Inferred`]), which the graph builder resolves to
//! the narrowest scope among the provider's mandatory sub-dependencies.

use std::fmt;

/// Lifetime tier controlling sharing granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance per application scope, the broadest tier.
    Application,
    /// One instance per thread scope.
    Thread,
    /// One instance per task scope, the narrowest ordered tier.
    Task,
    /// Constructed ad hoc in the requesting scope instance; incomparable
    /// to the ordered tiers.
    Factory,
}

impl Scope {
    /// Position in the broad-to-narrow ordering. `Factory` has none.
    fn rank(self) -> Option<u8> {
        match self {
            Self::Application => Some(0),
            Self::Thread => Some(1),
            Self::Task => Some(2),
            Self::Factory => None,
        }
    }

    /// Whether a value of this scope lives at least as long as a value of
    /// `other`, i.e. whether a provider scoped `other` may depend on a
    /// provider scoped `self`.
    ///
    /// `Factory` targets are only reachable from factory providers;
    /// factory providers themselves may depend on any tier.
    pub fn outlives(self, other: Scope) -> bool {
        match (self.rank(), other.rank()) {
            (Some(dep), Some(dependent)) => dep <= dependent,
            // Factory depending on anything is fine.
            (_, None) => true,
            // Nothing ordered may depend on a factory value.
            (None, Some(_)) => false,
        }
    }

    /// The narrower of two ordered scopes. Used by inference; factory
    /// scopes never take part.
    pub fn narrowest(self, other: Scope) -> Scope {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => {
                if a >= b {
                    self
                } else {
                    other
                }
            }
            (Some(_), None) => self,
            _ => other,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Application => "application",
            Self::Thread => "thread",
            Self::Task => "task",
            Self::Factory => "factory",
        };
        f.write_str(name)
    }
}

/// A provider's declared scope, or the request to infer one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeHint {
    /// Scope fixed at registration.
    Explicit(Scope),
    /// Scope resolved during graph build from the provider's mandatory
    /// sub-dependencies.
    Inferred,
}
