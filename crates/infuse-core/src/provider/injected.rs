//! Resolved sub-dependency values
//!
//! [`Injected`] carries the values the runtime resolved for a provider's
//! sub-dependencies, keyed by declared name. Recipes pull mandatory values
//! with [`Injected::get`] and optional ones with [`Injected::opt`]; an
//! absent optional value models a recipe parameter falling back to its
//! default.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::key::Instance;

/// Named, resolved sub-dependency values handed to a recipe.
#[derive(Default, Clone)]
pub struct Injected {
    values: HashMap<&'static str, Instance>,
}

impl Injected {
    /// Empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolved value under its declared name.
    pub fn insert(&mut self, name: &'static str, value: Instance) {
        self.values.insert(name, value);
    }

    /// The value for a mandatory sub-dependency. A never-declared name
    /// and a type not matching the declared edge fail distinctly.
    pub fn get<T: Send + Sync + 'static>(&self, name: &'static str) -> Result<Arc<T>> {
        let value = self.values.get(name).ok_or(Error::Injection {
            name,
            expected: std::any::type_name::<T>(),
        })?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| Error::InjectionMismatch {
                name,
                expected: std::any::type_name::<T>(),
            })
    }

    /// The value for an optional sub-dependency, `None` when it was
    /// omitted because no provider exists for its interface.
    pub fn opt<T: Send + Sync + 'static>(&self, name: &'static str) -> Option<Arc<T>> {
        self.values
            .get(name)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }

    /// Whether a value was resolved under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of resolved values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values were resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Injected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_roundtrips() {
        let mut injected = Injected::new();
        injected.insert("answer", Arc::new(42u32) as Instance);

        let value: Arc<u32> = injected.get("answer").unwrap();
        assert_eq!(*value, 42);
        assert!(injected.opt::<u32>("missing").is_none());
    }

    #[test]
    fn missing_and_mistyped_fail_distinctly() {
        let mut injected = Injected::new();
        injected.insert("answer", Arc::new(42u32) as Instance);

        assert!(matches!(
            injected.get::<u32>("missing").unwrap_err(),
            Error::Injection { name: "missing", .. }
        ));
        let err = injected.get::<String>("answer").unwrap_err();
        assert!(matches!(err, Error::InjectionMismatch { name: "answer", .. }));
        assert!(err.to_string().contains("is not a"));
    }
}
