//! The validated dependency graph
//!
//! Built once at container construction by [`builder`], then shared
//! read-only across every scope instance. Each entry is a
//! [`BoundProvider`]: a provider whose scope has been resolved to a
//! concrete tier (inference already applied) plus its eager flag.
//! Declaration order is preserved so eager construction runs in the order
//! providers were registered.

use std::collections::HashMap;
use std::sync::Arc;

use infuse_core::{Key, Provider, Scope};

pub(crate) mod builder;

/// A provider with its resolved scope and eager flag.
#[derive(Debug, Clone)]
pub struct BoundProvider {
    provider: Arc<Provider>,
    scope: Scope,
    eager: bool,
}

impl BoundProvider {
    pub(crate) fn new(provider: Arc<Provider>, scope: Scope, eager: bool) -> Self {
        Self {
            provider,
            scope,
            eager,
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// The resolved scope the provider's values live in.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether the provider is constructed on scope entry.
    pub fn is_eager(&self) -> bool {
        self.eager
    }
}

/// Immutable interface-to-provider mapping, validated at build.
#[derive(Debug, Default)]
pub struct Graph {
    providers: HashMap<Key, BoundProvider>,
    order: Vec<Key>,
}

impl Graph {
    /// The bound provider for `key`, if one is registered.
    pub fn get(&self, key: &Key) -> Option<&BoundProvider> {
        self.providers.get(key)
    }

    /// Whether a provider is registered for `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.providers.contains_key(key)
    }

    /// The resolved scope of the provider for `key`.
    pub fn scope_of(&self, key: &Key) -> Option<Scope> {
        self.providers.get(key).map(BoundProvider::scope)
    }

    /// Bound providers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundProvider> {
        self.order.iter().filter_map(|key| self.providers.get(key))
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
