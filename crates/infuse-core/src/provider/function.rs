//! Partially-applied callables
//!
//! A function or method provider does not construct the call's result: it
//! constructs a [`Func`], a callable closed over its already-resolved
//! sub-dependencies. The caller later supplies the remaining per-invocation
//! arguments (a request payload, a flag) while the dependency arguments
//! stay bound.
//!
//! `Func` is keyed by a caller-declared marker type `M`, so two callables
//! with identical signatures register under distinct interfaces:
//!
//! ```
//! use infuse_core::{Func, Provider};
//!
//! struct Greet; // marker
//!
//! let provider = Provider::bind::<Func<Greet, (String,), String>>()
//!     .from(|_deps| Ok(Func::new(|(name,): (String,)| format!("hello {name}"))));
//! # let _ = provider;
//! ```
//!
//! Suspending callables use `R = BoxFuture<'static, Out>` so the caller
//! awaits the invocation, not the lookup.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Name of the synthetic sub-dependency a method provider declares on its
/// owning instance.
pub const INSTANCE: &str = "instance";

/// A partially-applied callable produced by a function or method provider.
///
/// `M` is the registration marker, `A` the remaining argument tuple, `R`
/// the call result.
pub struct Func<M: ?Sized, A, R> {
    call: Arc<dyn Fn(A) -> R + Send + Sync>,
    _marker: PhantomData<fn(&M)>,
}

impl<M: ?Sized, A, R> Func<M, A, R> {
    /// Wrap a callable. Usually invoked from a provider recipe that has
    /// already captured the resolved dependencies.
    pub fn new(call: impl Fn(A) -> R + Send + Sync + 'static) -> Self {
        Self {
            call: Arc::new(call),
            _marker: PhantomData,
        }
    }

    /// Invoke with the remaining, non-injectable arguments.
    pub fn call(&self, args: A) -> R {
        (self.call)(args)
    }
}

impl<M: ?Sized, A, R> Clone for Func<M, A, R> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            _marker: PhantomData,
        }
    }
}

impl<M: ?Sized, A, R> fmt::Debug for Func<M, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func<{}>", std::any::type_name::<M>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    #[test]
    fn call_forwards_arguments() {
        let func: Func<Double, (i32,), i32> = Func::new(|(n,)| n * 2);
        assert_eq!(func.call((21,)), 42);

        let cloned = func.clone();
        assert_eq!(cloned.call((4,)), 8);
    }
}
