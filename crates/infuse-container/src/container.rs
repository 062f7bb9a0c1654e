//! Container assembly
//!
//! A [`Container`] owns a validated [`Graph`] and opens scope instances
//! against it. Building the container is the only place validation runs;
//! a container that exists always holds a graph with no duplicates, no
//! unresolved mandatory edges, no cycles and no lifetime inversions.

use std::future::Future;
use std::sync::Arc;

use infuse_core::Result;
use tracing::info;

use crate::graph::{self, Graph};
use crate::package::{ContextualizedProvider, Package};
use crate::runtime::blocking::BlockingApplicationScope;
use crate::runtime::scopes::ApplicationScope;

/// An immutable, validated collection of providers.
///
/// Cheap to clone; scope instances opened from clones share the graph but
/// never share cached values.
#[derive(Clone)]
pub struct Container {
    graph: Arc<Graph>,
}

impl Container {
    /// Start assembling a container from packages and loose providers.
    #[must_use]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::default()
    }

    /// The validated dependency graph backing this container.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Open the root application scope, constructing its eager providers.
    pub async fn application_scope(&self) -> Result<ApplicationScope> {
        ApplicationScope::open(Arc::clone(&self.graph)).await
    }

    /// Open a root application scope that never suspends.
    pub fn blocking_application_scope(&self) -> Result<BlockingApplicationScope> {
        BlockingApplicationScope::open(Arc::clone(&self.graph))
    }

    /// Open an application scope, run `body`, close on every exit path.
    ///
    /// Teardown failures after a successful body surface as the returned
    /// error; after a failed body they are logged and the body error wins.
    pub async fn with_application_scope<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(ApplicationScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = self.application_scope().await?;
        let outcome = body(scope.clone()).await;
        scope.finish(outcome).await
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("providers", &self.graph.len())
            .finish()
    }
}

/// Accumulates contextualized providers, then validates them into a
/// [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
    providers: Vec<ContextualizedProvider>,
}

impl ContainerBuilder {
    /// Add every provider a package contributes, including its extra
    /// dependencies.
    #[must_use]
    pub fn package(mut self, package: impl Package) -> Self {
        self.providers.extend(package.providers());
        self.providers.extend(package.extra_dependencies());
        self
    }

    /// Add a single contextualized provider.
    #[must_use]
    pub fn provider(mut self, provider: ContextualizedProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Validate the accumulated providers into a container.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: duplicate interfaces, missing
    /// mandatory dependencies, dependency cycles or a provider depending
    /// on something shorter-lived than itself.
    pub fn build(self) -> Result<Container> {
        let count = self.providers.len();
        let graph = graph::builder::build(self.providers)?;
        info!(providers = count, "dependency graph validated");
        Ok(Container {
            graph: Arc::new(graph),
        })
    }
}
