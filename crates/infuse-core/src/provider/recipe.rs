//! Construction recipes
//!
//! A [`Recipe`] is the erased construction step of a provider. The four
//! variants are the product of two axes: whether construction can suspend,
//! and whether the result is a plain value or a resource that must be torn
//! down when its owning scope instance exits.
//!
//! Suspension is explicit: suspending recipes and teardowns are boxed
//! futures, never implicit language suspension points, so a blocking scope
//! can reject them by inspecting [`Recipe::suspends`] before construction
//! starts.

use std::fmt;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::key::Instance;
use crate::provider::injected::Injected;

/// Teardown of a blocking resource.
pub type BlockingTeardownFn = Box<dyn FnOnce() -> Result<()> + Send>;

/// Teardown of a suspending resource.
pub type SuspendingTeardownFn = BoxFuture<'static, Result<()>>;

type BlockingFn = Box<dyn Fn(Injected) -> Result<Instance> + Send + Sync>;
type SuspendingFn = Box<dyn Fn(Injected) -> BoxFuture<'static, Result<Instance>> + Send + Sync>;
type BlockingResourceFn =
    Box<dyn Fn(Injected) -> Result<(Instance, BlockingTeardownFn)> + Send + Sync>;
type SuspendingResourceFn =
    Box<dyn Fn(Injected) -> BoxFuture<'static, Result<(Instance, Teardown)>> + Send + Sync>;

/// A pending cleanup operation, pushed onto a scope instance's teardown
/// stack when a resource is entered and executed in reverse order on exit.
pub enum Teardown {
    /// Cleanup that completes without suspending.
    Blocking(BlockingTeardownFn),
    /// Cleanup that must be awaited.
    Suspending(SuspendingTeardownFn),
}

impl Teardown {
    /// Whether running this teardown requires suspension.
    pub fn suspends(&self) -> bool {
        matches!(self, Self::Suspending(_))
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("Teardown::Blocking"),
            Self::Suspending(_) => f.write_str("Teardown::Suspending"),
        }
    }
}

/// The erased construction step of a provider.
pub enum Recipe {
    /// Plain value, constructed without suspending.
    Blocking(BlockingFn),
    /// Plain value whose construction must be awaited.
    Suspending(SuspendingFn),
    /// Resource entered without suspending, with a blocking teardown.
    BlockingResource(BlockingResourceFn),
    /// Resource whose entry must be awaited, with its own teardown kind.
    SuspendingResource(SuspendingResourceFn),
}

impl Recipe {
    /// Whether construction or teardown of this recipe can suspend.
    /// Blocking scopes refuse suspending recipes with a dependency error
    /// instead of suspending.
    pub fn suspends(&self) -> bool {
        matches!(self, Self::Suspending(_) | Self::SuspendingResource(_))
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Blocking(_) => "Recipe::Blocking",
            Self::Suspending(_) => "Recipe::Suspending",
            Self::BlockingResource(_) => "Recipe::BlockingResource",
            Self::SuspendingResource(_) => "Recipe::SuspendingResource",
        };
        f.write_str(name)
    }
}

/// The outcome of invoking a provider: either a plain value or a resource
/// that was just entered and owes a teardown to its owning scope instance.
pub enum Constructed {
    /// A plain constructed value.
    Value(Instance),
    /// An entered resource and its pending exit operation.
    Resource {
        /// The usable value.
        value: Instance,
        /// The exit operation, to run at scope exit.
        teardown: Teardown,
    },
}

impl fmt::Debug for Constructed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Constructed::Value"),
            Self::Resource { teardown, .. } => {
                write!(f, "Constructed::Resource({teardown:?})")
            }
        }
    }
}
