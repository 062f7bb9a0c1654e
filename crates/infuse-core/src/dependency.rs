//! Sub-dependency descriptors
//!
//! A [`SubDependency`] is one named, typed edge from a provider to another
//! interface. Non-mandatory edges model recipe parameters with defaults:
//! they are resolved only when the target interface has a provider, and
//! omitted otherwise.

use crate::key::Key;

/// A named, typed reference from one provider to another interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubDependency {
    /// Parameter name the resolved value is injected under.
    pub name: &'static str,
    /// Interface the edge points at.
    pub key: Key,
    /// Whether resolution fails when no provider exists for `key`.
    pub mandatory: bool,
}

impl SubDependency {
    /// A mandatory edge to the interface `T`.
    pub fn required<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: Key::of::<T>(),
            mandatory: true,
        }
    }

    /// An optional edge to the interface `T`, resolved only when a provider
    /// is registered for it.
    pub fn optional<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: Key::of::<T>(),
            mandatory: false,
        }
    }
}
