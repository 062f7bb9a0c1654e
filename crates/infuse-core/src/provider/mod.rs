//! The provider abstraction
//!
//! A [`Provider`] is one construction recipe: the interface it provides,
//! the ordered sub-dependencies it consumes, and an erased [`Recipe`] that
//! turns resolved values into a [`Constructed`] result.
//!
//! Sub-dependency lists are declared explicitly through
//! [`ProviderBuilder`] rather than derived by runtime introspection, so
//! every edge is compile-time checked at its registration site:
//!
//! ```
//! use std::sync::Arc;
//! use infuse_core::{Injected, Provider};
//!
//! struct Pool;
//! struct Repo { pool: Arc<Pool> }
//!
//! let pool = Provider::bind::<Pool>().from(|_deps| Ok(Pool));
//! let repo = Provider::bind::<Repo>()
//!     .needs::<Pool>("pool")
//!     .from(|deps: Injected| Ok(Repo { pool: deps.get("pool")? }));
//! # let _ = (pool, repo);
//! ```
//!
//! The provider variants of the registration surface (instance,
//! interfaced instance, function, method, delegated) are all constructors
//! over this single type; the graph builder and the runtime treat them
//! uniformly.

pub mod function;
pub mod injected;
pub mod recipe;

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::dependency::SubDependency;
use crate::error::{Error, Result};
use crate::key::{Instance, Key};
use function::{Func, INSTANCE};
use injected::Injected;
use recipe::{BlockingTeardownFn, Constructed, Recipe, Teardown};

/// One construction recipe for one interface. Immutable after creation.
pub struct Provider {
    interface: Key,
    sub_dependencies: Vec<SubDependency>,
    recipe: Recipe,
}

impl Provider {
    /// Start declaring a provider for the interface `T`.
    ///
    /// For a trait interface, bind the service pointer type:
    /// `Provider::bind::<Arc<dyn Mailer>>()`.
    pub fn bind<T: Send + Sync + 'static>() -> ProviderBuilder<T> {
        ProviderBuilder {
            interface: Key::of::<T>(),
            sub_dependencies: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// A method provider: a [`Func`] bound to the owning instance, which
    /// is itself resolved from the graph through one synthetic mandatory
    /// sub-dependency named [`INSTANCE`].
    pub fn method<M, Owner, A, R, F>(call: F) -> Self
    where
        M: ?Sized + 'static,
        Owner: Send + Sync + 'static,
        A: 'static,
        R: 'static,
        F: Fn(Arc<Owner>, A) -> R + Send + Sync + 'static,
    {
        let call = Arc::new(call);
        Self::bind::<Func<M, A, R>>()
            .needs::<Owner>(INSTANCE)
            .from(move |deps: Injected| {
                let owner = deps.get::<Owner>(INSTANCE)?;
                let call = Arc::clone(&call);
                Ok(Func::new(move |args: A| call(Arc::clone(&owner), args)))
            })
    }

    /// A delegated provider: a raw recipe registered under an explicit key
    /// with an explicit edge list. The escape hatch for wrapping recipes
    /// whose shape the typed builder cannot express.
    ///
    /// Panics when two sub-dependencies share a name.
    pub fn delegated(
        interface: Key,
        sub_dependencies: Vec<SubDependency>,
        recipe: Recipe,
    ) -> Self {
        for (index, dep) in sub_dependencies.iter().enumerate() {
            assert!(
                !sub_dependencies[..index].iter().any(|d| d.name == dep.name),
                "sub-dependency `{}` already declared for {}",
                dep.name,
                interface,
            );
        }
        Self {
            interface,
            sub_dependencies,
            recipe,
        }
    }

    /// The interface this provider is registered under.
    pub fn interface(&self) -> Key {
        self.interface
    }

    /// The declared sub-dependencies, in declaration order.
    pub fn sub_dependencies(&self) -> &[SubDependency] {
        &self.sub_dependencies
    }

    /// Whether construction or teardown of this provider can suspend.
    pub fn suspends(&self) -> bool {
        self.recipe.suspends()
    }

    /// Invoke the recipe with resolved sub-dependency values, awaiting
    /// suspension points as the recipe requires.
    pub async fn provide(&self, deps: Injected) -> Result<Constructed> {
        match &self.recipe {
            Recipe::Blocking(build) => Ok(Constructed::Value(build(deps)?)),
            Recipe::Suspending(build) => Ok(Constructed::Value(build(deps).await?)),
            Recipe::BlockingResource(enter) => {
                let (value, teardown) = enter(deps)?;
                Ok(Constructed::Resource {
                    value,
                    teardown: Teardown::Blocking(teardown),
                })
            }
            Recipe::SuspendingResource(enter) => {
                let (value, teardown) = enter(deps).await?;
                Ok(Constructed::Resource { value, teardown })
            }
        }
    }

    /// Invoke the recipe without suspension support. Fails with
    /// [`Error::SyncSuspension`] when the recipe would need to suspend.
    pub fn provide_blocking(&self, deps: Injected) -> Result<Constructed> {
        match &self.recipe {
            Recipe::Blocking(build) => Ok(Constructed::Value(build(deps)?)),
            Recipe::BlockingResource(enter) => {
                let (value, teardown) = enter(deps)?;
                Ok(Constructed::Resource {
                    value,
                    teardown: Teardown::Blocking(teardown),
                })
            }
            Recipe::Suspending(_) | Recipe::SuspendingResource(_) => Err(Error::SyncSuspension {
                interface: self.interface.name(),
            }),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("interface", &self.interface)
            .field("sub_dependencies", &self.sub_dependencies)
            .field("recipe", &self.recipe)
            .finish()
    }
}

/// Declares a provider's edges, then binds one of the four recipe kinds.
pub struct ProviderBuilder<T> {
    interface: Key,
    sub_dependencies: Vec<SubDependency>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ProviderBuilder<T> {
    /// Declare a mandatory sub-dependency on the interface `D`, injected
    /// under `name`.
    ///
    /// Panics when `name` was already declared; each recipe parameter maps
    /// to exactly one edge.
    pub fn needs<D: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.push(SubDependency::required::<D>(name))
    }

    /// Declare an optional sub-dependency: resolved only when a provider
    /// exists for `D`, omitted from [`Injected`] otherwise.
    pub fn wants<D: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.push(SubDependency::optional::<D>(name))
    }

    fn push(mut self, dep: SubDependency) -> Self {
        assert!(
            !self.sub_dependencies.iter().any(|d| d.name == dep.name),
            "sub-dependency `{}` already declared for {}",
            dep.name,
            self.interface,
        );
        self.sub_dependencies.push(dep);
        self
    }

    /// Bind a blocking value recipe.
    pub fn from<F>(self, build: F) -> Provider
    where
        F: Fn(Injected) -> Result<T> + Send + Sync + 'static,
    {
        Provider {
            interface: self.interface,
            sub_dependencies: self.sub_dependencies,
            recipe: Recipe::Blocking(Box::new(move |deps| {
                build(deps).map(|value| Arc::new(value) as Instance)
            })),
        }
    }

    /// Bind a suspending value recipe.
    pub fn from_async<F, Fut>(self, build: F) -> Provider
    where
        F: Fn(Injected) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Provider {
            interface: self.interface,
            sub_dependencies: self.sub_dependencies,
            recipe: Recipe::Suspending(Box::new(move |deps| {
                let building = build(deps);
                Box::pin(async move { building.await.map(|value| Arc::new(value) as Instance) })
            })),
        }
    }

    /// Bind a blocking resource recipe: entry yields the value plus a
    /// blocking exit operation, run at scope exit in reverse construction
    /// order.
    pub fn from_resource<F, C>(self, enter: F) -> Provider
    where
        F: Fn(Injected) -> Result<(T, C)> + Send + Sync + 'static,
        C: FnOnce() -> Result<()> + Send + 'static,
    {
        Provider {
            interface: self.interface,
            sub_dependencies: self.sub_dependencies,
            recipe: Recipe::BlockingResource(Box::new(move |deps| {
                let (value, exit) = enter(deps)?;
                Ok((
                    Arc::new(value) as Instance,
                    Box::new(exit) as BlockingTeardownFn,
                ))
            })),
        }
    }

    /// Bind a suspending resource recipe: entry is awaited and the exit
    /// operation is itself a future, awaited at scope exit.
    pub fn from_async_resource<F, Fut, C>(self, enter: F) -> Provider
    where
        F: Fn(Injected) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(T, C)>> + Send + 'static,
        C: Future<Output = Result<()>> + Send + 'static,
    {
        Provider {
            interface: self.interface,
            sub_dependencies: self.sub_dependencies,
            recipe: Recipe::SuspendingResource(Box::new(move |deps| {
                let entering = enter(deps);
                Box::pin(async move {
                    let (value, exit) = entering.await?;
                    Ok((
                        Arc::new(value) as Instance,
                        Teardown::Suspending(Box::pin(exit)),
                    ))
                })
            })),
        }
    }
}

impl<M, A, R> ProviderBuilder<Func<M, A, R>>
where
    M: ?Sized + 'static,
    A: 'static,
    R: 'static,
{
    /// Bind a function recipe. The callable receives the resolved
    /// sub-dependencies plus the per-invocation arguments; the constructed
    /// value is the [`Func`] partial with the dependencies already bound.
    pub fn from_call<F>(self, call: F) -> Provider
    where
        F: Fn(&Injected, A) -> R + Send + Sync + 'static,
    {
        let call = Arc::new(call);
        self.from(move |deps: Injected| {
            let call = Arc::clone(&call);
            let deps = Arc::new(deps);
            Ok(Func::new(move |args: A| call(&deps, args)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Standalone;

    struct Nested {
        standalone: Arc<Standalone>,
    }

    #[test]
    fn builder_records_edges_in_order() {
        let provider = Provider::bind::<Nested>()
            .needs::<Standalone>("standalone")
            .wants::<u32>("retries")
            .from(|deps| {
                Ok(Nested {
                    standalone: deps.get("standalone")?,
                })
            });

        let deps = provider.sub_dependencies();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0], SubDependency::required::<Standalone>("standalone"));
        assert_eq!(deps[1], SubDependency::optional::<u32>("retries"));
        assert!(!provider.suspends());
    }

    #[test]
    #[should_panic(expected = "already declared")]
    fn duplicate_edge_names_panic() {
        let _ = Provider::bind::<Nested>()
            .needs::<Standalone>("dep")
            .wants::<u32>("dep");
    }

    #[tokio::test]
    async fn provide_injects_resolved_values() {
        let provider = Provider::bind::<Nested>()
            .needs::<Standalone>("standalone")
            .from(|deps| {
                Ok(Nested {
                    standalone: deps.get("standalone")?,
                })
            });

        let standalone = Arc::new(Standalone);
        let mut deps = Injected::new();
        deps.insert("standalone", Arc::clone(&standalone) as Instance);

        match provider.provide(deps).await.unwrap() {
            Constructed::Value(value) => {
                let nested = value.downcast::<Nested>().unwrap();
                assert!(Arc::ptr_eq(&nested.standalone, &standalone));
            }
            other => panic!("expected a plain value, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn method_provider_binds_the_owner() {
        struct Tasks {
            standalone: Arc<Standalone>,
        }
        struct Run;

        let provider =
            Provider::method::<Run, Tasks, (bool,), (Arc<Standalone>, bool), _>(|tasks, (flag,)| {
                (Arc::clone(&tasks.standalone), flag)
            });

        assert_eq!(
            provider.sub_dependencies(),
            &[SubDependency::required::<Tasks>(INSTANCE)]
        );

        let standalone = Arc::new(Standalone);
        let owner = Arc::new(Tasks {
            standalone: Arc::clone(&standalone),
        });
        let mut deps = Injected::new();
        deps.insert(INSTANCE, owner as Instance);

        let Constructed::Value(value) = provider.provide(deps).await.unwrap() else {
            panic!("expected a plain value");
        };
        let func = value
            .downcast::<Func<Run, (bool,), (Arc<Standalone>, bool)>>()
            .unwrap();
        let (out, flag) = func.call((true,));
        assert!(Arc::ptr_eq(&out, &standalone));
        assert!(flag);
    }

    #[test]
    fn blocking_scope_rejects_suspending_recipes() {
        let provider = Provider::bind::<Standalone>().from_async(|_| async { Ok(Standalone) });
        assert!(provider.suspends());
        let err = provider.provide_blocking(Injected::new()).unwrap_err();
        assert!(matches!(err, Error::SyncSuspension { .. }));
    }
}
