//! Core types for the infuse dependency-injection container.
//!
//! This crate holds the leaf vocabulary shared by the graph builder and the
//! scope runtime: interface [`Key`]s, [`SubDependency`] descriptors, the
//! [`Provider`] abstraction with its four-way [`Recipe`] sum, lifetime
//! [`Scope`] tiers and the error taxonomy.
//!
//! Nothing here resolves anything. Resolution, caching and teardown live in
//! `infuse-container`; this crate only describes construction recipes and
//! their declared edges.

pub mod dependency;
pub mod error;
pub mod key;
pub mod provider;
pub mod scope;

pub use dependency::SubDependency;
pub use error::{Error, Result};
pub use key::{Instance, Key};
pub use provider::function::{Func, INSTANCE};
pub use provider::injected::Injected;
pub use provider::recipe::{Constructed, Recipe, Teardown};
pub use provider::{Provider, ProviderBuilder};
pub use scope::{Scope, ScopeHint};
