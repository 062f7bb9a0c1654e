//! Provider packages
//!
//! A [`Package`] is the enumeration surface the container consumes at
//! graph-build time: a group of related providers, each tagged with its
//! scope (explicit or inferred) and eager flag. Declarative registration
//! layers sit outside the core; anything that can yield
//! [`ContextualizedProvider`]s can feed a container.

use std::sync::Arc;

use infuse_core::{Provider, Scope, ScopeHint};

/// A provider plus its assigned scope and eager flag.
///
/// Eager providers are constructed when their owning scope instance is
/// entered, in declaration order, instead of lazily on first request.
#[derive(Debug, Clone)]
pub struct ContextualizedProvider {
    provider: Arc<Provider>,
    scope: ScopeHint,
    eager: bool,
}

impl ContextualizedProvider {
    /// Tag a provider with an explicit or inferred scope.
    pub fn new(provider: Provider, scope: ScopeHint) -> Self {
        Self {
            provider: Arc::new(provider),
            scope,
            eager: false,
        }
    }

    /// Application-scoped provider: one instance per application scope.
    pub fn application(provider: Provider) -> Self {
        Self::new(provider, ScopeHint::Explicit(Scope::Application))
    }

    /// Thread-scoped provider: one instance per thread scope.
    pub fn thread(provider: Provider) -> Self {
        Self::new(provider, ScopeHint::Explicit(Scope::Thread))
    }

    /// Task-scoped provider: one instance per task scope.
    pub fn task(provider: Provider) -> Self {
        Self::new(provider, ScopeHint::Explicit(Scope::Task))
    }

    /// Factory-scoped provider: constructed in whichever scope instance
    /// requests it. Never inferred; factory must be explicit.
    pub fn factory(provider: Provider) -> Self {
        Self::new(provider, ScopeHint::Explicit(Scope::Factory))
    }

    /// Provider whose scope is inferred at graph build from the narrowest
    /// scope among its mandatory sub-dependencies.
    pub fn auto(provider: Provider) -> Self {
        Self::new(provider, ScopeHint::Inferred)
    }

    /// Mark the provider eager: constructed on scope entry rather than on
    /// first request.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// The declared scope, or the request to infer one.
    pub fn scope(&self) -> ScopeHint {
        self.scope
    }

    /// Whether the provider is constructed eagerly on scope entry.
    pub fn is_eager(&self) -> bool {
        self.eager
    }
}

/// A group of providers registered together.
///
/// The container only consumes this enumeration once, at graph-build
/// time; the package itself carries no runtime behavior.
pub trait Package: Send + Sync {
    /// The providers this package contributes.
    fn providers(&self) -> Vec<ContextualizedProvider>;

    /// Extra pre-bound dependencies registered alongside the package's
    /// own providers.
    fn extra_dependencies(&self) -> Vec<ContextualizedProvider> {
        Vec::new()
    }
}
