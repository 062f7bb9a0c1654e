//! # infuse
//!
//! A dependency-injection container with a validated dependency graph and
//! nested lifetime scopes.
//!
//! Providers declare what they build and what they need; the container
//! validates the whole graph up front (duplicates, missing edges, cycles,
//! lifetime inversions) and then resolves lazily inside a hierarchy of
//! scope instances, each with its own cache and reverse-order teardown.
//!
//! ## Scopes
//!
//! - `application` - one per process, broadest sharing
//! - `thread` - one per worker, nested under the application
//! - `task` - one per unit of work, nested under a thread or the application
//! - `factory` - never shared, rebuilt for every requesting instance
//!
//! A provider's scope may be declared or inferred from the narrowest scope
//! among its mandatory dependencies.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use infuse::{Container, ContextualizedProvider, Provider};
//!
//! struct Config { url: String }
//! struct Pool { config: Arc<Config> }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> infuse::Result<()> {
//! let container = Container::builder()
//!     .provider(ContextualizedProvider::application(
//!         Provider::bind::<Config>()
//!             .from(|_| Ok(Config { url: "postgres://localhost".into() })),
//!     ))
//!     .provider(ContextualizedProvider::auto(
//!         Provider::bind::<Pool>()
//!             .needs::<Config>("config")
//!             .from(|deps| Ok(Pool { config: deps.get("config")? })),
//!     ))
//!     .build()?;
//!
//! let app = container.application_scope().await?;
//! let pool = app.get::<Pool>().await?;
//! assert_eq!(pool.config.url, "postgres://localhost");
//! app.close().await?;
//! # Ok(())
//! # }
//! ```

/// Provider vocabulary and the error taxonomy.
///
/// Re-exports from the core crate for convenience
pub mod core {
    pub use infuse_core::*;
}

/// Graph validation and the scope runtime.
///
/// Re-exports from the container crate for convenience
pub mod container {
    pub use infuse_container::*;
}

// Re-export the everyday surface at the crate root
pub use infuse_container::{
    ApplicationScope, BlockingApplicationScope, BlockingFactoryScope, BlockingTaskScope,
    BlockingThreadScope, Container, ContainerBuilder, ContextualizedProvider, FactoryScope,
    Graph, Package, TaskScope, ThreadScope,
};
pub use infuse_core::{
    Constructed, Error, Func, INSTANCE, Injected, Instance, Key, Provider, ProviderBuilder,
    Result, Scope, ScopeHint, SubDependency, Teardown,
};

/// One-line import for applications wiring a container.
pub mod prelude {
    pub use crate::{
        Container, ContextualizedProvider, Error, Package, Provider, Result, Scope,
    };
}
