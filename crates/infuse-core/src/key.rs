//! Interface identity
//!
//! A [`Key`] is the lookup identity of an interface: the `TypeId` of the
//! registered type plus its type name for diagnostics. Exactly one provider
//! may exist per key across a whole graph.
//!
//! Trait-object interfaces are registered under their service-pointer type,
//! e.g. `Key::of::<Arc<dyn Mailer>>()`, so the key stays a plain sized
//! lookup value while the constructed instance carries the dynamic dispatch.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// An erased constructed value, shared across the scope instances that
/// resolved it.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type identity used as the provider lookup key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Key for the interface type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Human-readable type name, for error messages and logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}

    #[test]
    fn same_type_same_key() {
        assert_eq!(Key::of::<String>(), Key::of::<String>());
        assert_ne!(Key::of::<String>(), Key::of::<u32>());
    }

    #[test]
    fn trait_objects_are_keyable() {
        let key = Key::of::<Arc<dyn Marker>>();
        assert_eq!(key, Key::of::<Arc<dyn Marker>>());
        assert!(key.name().contains("Marker"));
    }
}
