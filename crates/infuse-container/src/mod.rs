//! Resolution engine and scoped-lifecycle runtime.
//!
//! This crate turns registered providers into a validated, immutable
//! dependency [`Graph`](graph::Graph) and runs it inside a hierarchy of
//! lifetime scopes:
//!
//! ```text
//! Container (immutable graph)
//! └── ApplicationScope
//!     ├── ThreadScope           (many, concurrent)
//!     │   └── TaskScope         (many, concurrent)
//!     ├── TaskScope             (task directly under application)
//!     └── FactoryScope          (ad hoc, from any live scope)
//! ```
//!
//! Each scope instance owns a memoized construction cache and a teardown
//! stack drained in reverse order on exit. Values are cached in the
//! nearest instance whose scope matches the provider's scope, so broader
//! values are shared across all descendants of their owning instance.
//!
//! The runtime is async-first: `get` is uniformly awaitable and the
//! blocking mirror ([`runtime::blocking`]) rejects suspending recipes with
//! a dependency error instead of suspending.

pub mod container;
pub mod graph;
pub mod package;
pub mod runtime;

pub use container::{Container, ContainerBuilder};
pub use graph::{BoundProvider, Graph};
pub use package::{ContextualizedProvider, Package};
pub use runtime::blocking::{
    BlockingApplicationScope, BlockingFactoryScope, BlockingTaskScope, BlockingThreadScope,
};
pub use runtime::scopes::{ApplicationScope, FactoryScope, TaskScope, ThreadScope};
