//! Error handling types
//!
//! One enum covers both graph-build failures (duplicate providers,
//! unresolved or cyclic dependencies, scope mismatches) and runtime
//! failures (suspension from a blocking scope, use after close, recipe
//! failures, collected teardown errors). Build failures are fatal to
//! container construction; runtime failures abort only the resolution
//! chain that raised them.

use thiserror::Error;

use crate::scope::Scope;

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the infuse container.
#[derive(Error, Debug)]
pub enum Error {
    /// Two providers were registered for one interface (build-time).
    #[error("multiple providers found for interface {interface}")]
    DuplicateProvider {
        /// The interface registered twice.
        interface: &'static str,
    },

    /// A mandatory sub-dependency has no provider (build-time).
    #[error("no provider found for {interface} (required by {required_by})")]
    UnresolvedDependency {
        /// The interface with no provider.
        interface: &'static str,
        /// The provider, or request site, that needed it.
        required_by: &'static str,
    },

    /// A cycle exists among mandatory edges (build-time).
    #[error("circular dependency found: {cycle}")]
    CircularDependency {
        /// The cycle members, in edge order.
        cycle: String,
    },

    /// A provider depends on a strictly narrower-scoped provider
    /// (build-time).
    #[error(
        "context error: {provider} ({provider_scope}) depends on narrower-scoped {dependency} ({dependency_scope})"
    )]
    ContextMismatch {
        /// The dependent provider's interface.
        provider: &'static str,
        /// The dependent provider's scope.
        provider_scope: Scope,
        /// The dependency's interface.
        dependency: &'static str,
        /// The dependency's scope.
        dependency_scope: Scope,
    },

    /// A blocking scope attempted to resolve a suspending recipe (runtime).
    #[error("{interface} requires suspension and cannot be resolved from a blocking scope")]
    SyncSuspension {
        /// The interface whose recipe suspends.
        interface: &'static str,
    },

    /// A scope instance was used after `close` (runtime).
    #[error("scope instance is closed")]
    ScopeClosed,

    /// A recipe asked for a value that was never injected (runtime;
    /// indicates a mis-declared builder edge).
    #[error("no value injected for `{name}` ({expected})")]
    Injection {
        /// The requested parameter name.
        name: &'static str,
        /// The requested type.
        expected: &'static str,
    },

    /// A recipe asked for an injected value with a type other than the
    /// declared edge's (runtime).
    #[error("value injected for `{name}` is not a {expected}")]
    InjectionMismatch {
        /// The requested parameter name.
        name: &'static str,
        /// The requested type.
        expected: &'static str,
    },

    /// A recipe failed while constructing its value (runtime).
    #[error("construction failed: {message}")]
    Construction {
        /// Description of the failure.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// One or more teardown operations failed during scope exit (runtime).
    /// Every stack entry still ran.
    #[error("scope teardown reported {} failure(s): {}", failures.len(), failures.join("; "))]
    Teardown {
        /// Messages of the individual failures, in teardown order.
        failures: Vec<String>,
    },
}

impl Error {
    /// Create a construction error.
    pub fn construction<S: Into<String>>(message: S) -> Self {
        Self::Construction {
            message: message.into(),
            source: None,
        }
    }

    /// Create a construction error with source.
    pub fn construction_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Construction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the error is one of the build-time graph validation
    /// failures.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateProvider { .. }
                | Self::UnresolvedDependency { .. }
                | Self::CircularDependency { .. }
                | Self::ContextMismatch { .. }
        )
    }
}
