//! Scope runtime
//!
//! One [`ScopeCore`] is one live activation of a scope: it owns a
//! memoized construction cache, a LIFO teardown stack, and a non-owning
//! lookup chain to its ancestors. Parents never reference children, so
//! sibling scope instances come and go independently and there is no
//! ownership cycle.
//!
//! Resolution walks the provider's edges recursively, constructing each
//! value in the nearest ancestor-or-self instance whose scope matches the
//! provider's scope. Construction is single-flight per instance and
//! interface: concurrent requests for the same not-yet-built value wait on
//! one in-flight build. A failed build leaves the cache slot empty, so a
//! later request within the same instance retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use futures::future::BoxFuture;
use infuse_core::{Constructed, Error, Injected, Instance, Key, Result, Scope, Teardown};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::graph::Graph;

pub mod blocking;
pub mod scopes;

/// State and machinery shared by the four scope types.
pub(crate) struct ScopeCore {
    kind: Scope,
    graph: Arc<Graph>,
    parent: Option<Arc<ScopeCore>>,
    cache: DashMap<Key, Arc<OnceCell<Instance>>>,
    teardown: Mutex<Vec<Teardown>>,
    closed: AtomicBool,
}

impl ScopeCore {
    pub(crate) fn new(kind: Scope, graph: Arc<Graph>, parent: Option<Arc<ScopeCore>>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            graph,
            parent,
            cache: DashMap::new(),
            teardown: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn graph(&self) -> Arc<Graph> {
        Arc::clone(&self.graph)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The instance that owns values of `scope`: the nearest
    /// ancestor-or-self with a matching kind, or the requesting instance
    /// when no ancestor matches (factory values, and broader-tier values
    /// requested without an intermediate scope, e.g. a thread-scoped value
    /// from an application instance).
    fn owner(self: &Arc<Self>, scope: Scope) -> Arc<Self> {
        if scope == Scope::Factory {
            return Arc::clone(self);
        }
        let mut current = Arc::clone(self);
        loop {
            if current.kind == scope {
                return current;
            }
            match &current.parent {
                Some(parent) => current = Arc::clone(parent),
                None => return Arc::clone(self),
            }
        }
    }

    /// Resolve the value for `key` within this instance's chain.
    ///
    /// Boxed so the recursive walk through sub-dependencies has a sized
    /// future type.
    pub(crate) fn resolve(self: Arc<Self>, key: Key) -> BoxFuture<'static, Result<Instance>> {
        Box::pin(async move {
            if self.is_closed() {
                return Err(Error::ScopeClosed);
            }
            let Some(bound) = self.graph.get(&key) else {
                return Err(Error::UnresolvedDependency {
                    interface: key.name(),
                    required_by: "scope request",
                });
            };
            let owner = self.owner(bound.scope());
            if owner.is_closed() {
                return Err(Error::ScopeClosed);
            }
            let cell = owner
                .cache
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            let value = cell.get_or_try_init(|| owner.construct(key)).await?;
            Ok(Arc::clone(value))
        })
    }

    /// Construct the value for `key` in this instance: resolve every
    /// sub-dependency, invoke the provider, and keep the teardown of any
    /// entered resource on this instance's stack.
    async fn construct(self: &Arc<Self>, key: Key) -> Result<Instance> {
        let bound = self.graph.get(&key).ok_or(Error::UnresolvedDependency {
            interface: key.name(),
            required_by: "scope request",
        })?;
        let provider = bound.provider();

        let mut injected = Injected::new();
        for dep in provider.sub_dependencies() {
            if dep.mandatory || self.graph.contains(&dep.key) {
                let value = Arc::clone(self).resolve(dep.key).await?;
                injected.insert(dep.name, value);
            }
        }

        debug!(interface = %key, scope = %self.kind, "constructing dependency");
        match provider.provide(injected).await? {
            Constructed::Value(value) => Ok(value),
            Constructed::Resource { value, teardown } => {
                // The instance may have closed while the recipe ran; its
                // stack is already drained, so park nothing there. Unwind
                // the resource now and fail the request instead.
                let mut stack = self.teardown.lock().await;
                if self.is_closed() {
                    drop(stack);
                    let outcome = match teardown {
                        Teardown::Blocking(exit) => exit(),
                        Teardown::Suspending(exit) => exit.await,
                    };
                    if let Err(err) = outcome {
                        warn!(interface = %key, error = %err, "teardown of late-constructed resource failed");
                    }
                    return Err(Error::ScopeClosed);
                }
                stack.push(teardown);
                drop(stack);
                Ok(value)
            }
        }
    }

    /// Scope entry: construct this tier's eager providers in declaration
    /// order. On failure the instance is closed so already-entered
    /// resources unwind before the error propagates.
    pub(crate) async fn enter(self: &Arc<Self>) -> Result<()> {
        let eager: Vec<Key> = self
            .graph
            .iter()
            .filter(|bound| bound.scope() == self.kind && bound.is_eager())
            .map(|bound| bound.provider().interface())
            .collect();
        for key in eager {
            if let Err(err) = Arc::clone(self).resolve(key).await {
                if let Err(teardown_err) = self.close().await {
                    warn!(error = %teardown_err, "teardown failures while unwinding failed scope entry");
                }
                return Err(err);
            }
        }
        debug!(scope = %self.kind, "scope instance entered");
        Ok(())
    }

    /// Scope exit: drain the teardown stack in reverse construction
    /// order. Every entry runs even when earlier ones fail; failures are
    /// collected. Idempotent.
    pub(crate) async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut stack = std::mem::take(&mut *self.teardown.lock().await);
        let mut failures = Vec::new();
        while let Some(teardown) = stack.pop() {
            let outcome = match teardown {
                Teardown::Blocking(exit) => exit(),
                Teardown::Suspending(exit) => exit.await,
            };
            if let Err(err) = outcome {
                warn!(scope = %self.kind, error = %err, "teardown entry failed");
                failures.push(err.to_string());
            }
        }
        debug!(scope = %self.kind, "scope instance closed");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Teardown { failures })
        }
    }
}
