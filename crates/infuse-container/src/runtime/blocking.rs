//! Blocking scope instances
//!
//! The same ownership, single-flight, eager and teardown rules as the
//! async runtime, for callers with no suspension machinery. Resolving a
//! provider whose recipe can suspend fails up front with
//! [`Error::SyncSuspension`]; it never blocks on a future.
//!
//! Single flight uses one mutex per cache slot: the first caller holds
//! the slot while constructing, concurrent callers for the same interface
//! block on it and find the cached value. A failed build leaves the slot
//! empty so a later request retries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use infuse_core::{
    Constructed, Error, Injected, Instance, Key, Result, Scope, Teardown,
    provider::recipe::BlockingTeardownFn,
};
use tracing::{debug, error, warn};

use crate::graph::Graph;

struct BlockingCore {
    kind: Scope,
    graph: Arc<Graph>,
    parent: Option<Arc<BlockingCore>>,
    cache: DashMap<Key, Arc<Mutex<Option<Instance>>>>,
    teardown: Mutex<Vec<BlockingTeardownFn>>,
    closed: AtomicBool,
}

impl BlockingCore {
    fn new(kind: Scope, graph: Arc<Graph>, parent: Option<Arc<BlockingCore>>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            graph,
            parent,
            cache: DashMap::new(),
            teardown: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

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

    fn resolve(self: &Arc<Self>, key: Key) -> Result<Instance> {
        if self.is_closed() {
            return Err(Error::ScopeClosed);
        }
        let Some(bound) = self.graph.get(&key) else {
            return Err(Error::UnresolvedDependency {
                interface: key.name(),
                required_by: "scope request",
            });
        };
        if bound.provider().suspends() {
            return Err(Error::SyncSuspension {
                interface: key.name(),
            });
        }
        let owner = self.owner(bound.scope());
        if owner.is_closed() {
            return Err(Error::ScopeClosed);
        }
        let cell = owner
            .cache
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        let mut slot = cell.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = owner.construct(key)?;
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    fn construct(self: &Arc<Self>, key: Key) -> Result<Instance> {
        let bound = self.graph.get(&key).ok_or(Error::UnresolvedDependency {
            interface: key.name(),
            required_by: "scope request",
        })?;
        let provider = bound.provider();

        let mut injected = Injected::new();
        for dep in provider.sub_dependencies() {
            if dep.mandatory || self.graph.contains(&dep.key) {
                injected.insert(dep.name, self.resolve(dep.key)?);
            }
        }

        debug!(interface = %key, scope = %self.kind, "constructing dependency (blocking)");
        match provider.provide_blocking(injected)? {
            Constructed::Value(value) => Ok(value),
            Constructed::Resource {
                value,
                teardown: Teardown::Blocking(exit),
            } => {
                // The instance may have closed while the recipe ran; its
                // stack is already drained. Unwind the resource now and
                // fail the request instead of parking the exit.
                let mut stack = self.teardown.lock().unwrap_or_else(PoisonError::into_inner);
                if self.is_closed() {
                    drop(stack);
                    if let Err(err) = exit() {
                        warn!(interface = %key, error = %err, "teardown of late-constructed resource failed");
                    }
                    return Err(Error::ScopeClosed);
                }
                stack.push(exit);
                drop(stack);
                Ok(value)
            }
            Constructed::Resource { .. } => {
                // provide_blocking never yields a suspending teardown.
                Err(Error::SyncSuspension {
                    interface: key.name(),
                })
            }
        }
    }

    fn enter(self: &Arc<Self>) -> Result<()> {
        let eager: Vec<Key> = self
            .graph
            .iter()
            .filter(|bound| bound.scope() == self.kind && bound.is_eager())
            .map(|bound| bound.provider().interface())
            .collect();
        for key in eager {
            if let Err(err) = self.resolve(key) {
                if let Err(teardown_err) = self.close() {
                    warn!(error = %teardown_err, "teardown failures while unwinding failed scope entry");
                }
                return Err(err);
            }
        }
        debug!(scope = %self.kind, "blocking scope instance entered");
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut stack = std::mem::take(
            &mut *self
                .teardown
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut failures = Vec::new();
        while let Some(exit) = stack.pop() {
            if let Err(err) = exit() {
                warn!(scope = %self.kind, error = %err, "teardown entry failed");
                failures.push(err.to_string());
            }
        }
        debug!(scope = %self.kind, "blocking scope instance closed");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Teardown { failures })
        }
    }
}

fn get_from<T: Send + Sync + 'static>(core: &Arc<BlockingCore>) -> Result<Arc<T>> {
    let instance = core.resolve(Key::of::<T>())?;
    instance.downcast::<T>().map_err(|_| {
        Error::construction(format!(
            "provider for {} produced a value of a different type",
            Key::of::<T>()
        ))
    })
}

fn open_child(parent: &Arc<BlockingCore>, kind: Scope) -> Result<Arc<BlockingCore>> {
    if parent.is_closed() {
        return Err(Error::ScopeClosed);
    }
    let core = BlockingCore::new(kind, Arc::clone(&parent.graph), Some(Arc::clone(parent)));
    core.enter()?;
    Ok(core)
}

fn close_after<T>(core: &Arc<BlockingCore>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => core.close().map(|()| value),
        Err(err) => {
            if let Err(teardown_err) = core.close() {
                error!(error = %teardown_err, "teardown failures while unwinding failed scope body");
            }
            Err(err)
        }
    }
}

/// Blocking variant of the application scope.
#[derive(Clone)]
pub struct BlockingApplicationScope {
    core: Arc<BlockingCore>,
}

impl BlockingApplicationScope {
    pub(crate) fn open(graph: Arc<Graph>) -> Result<Self> {
        let core = BlockingCore::new(Scope::Application, graph, None);
        core.enter()?;
        Ok(Self { core })
    }

    /// Resolve the value registered for `T` without suspending.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core)
    }

    /// Open a blocking thread scope nested under this instance.
    pub fn thread_scope(&self) -> Result<BlockingThreadScope> {
        Ok(BlockingThreadScope {
            core: open_child(&self.core, Scope::Thread)?,
        })
    }

    /// Open a blocking task scope directly under this instance.
    pub fn task_scope(&self) -> Result<BlockingTaskScope> {
        Ok(BlockingTaskScope {
            core: open_child(&self.core, Scope::Task)?,
        })
    }

    /// Open a blocking factory scope under this instance.
    pub fn factory_scope(&self) -> Result<BlockingFactoryScope> {
        Ok(BlockingFactoryScope {
            core: open_child(&self.core, Scope::Factory)?,
        })
    }

    /// Enter a task scope, run `body`, close on every exit path.
    pub fn with_task_scope<F, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&BlockingTaskScope) -> Result<T>,
    {
        let scope = self.task_scope()?;
        let outcome = body(&scope);
        close_after(&scope.core, outcome)
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub fn close(&self) -> Result<()> {
        self.core.close()
    }
}

/// Blocking variant of the thread scope.
#[derive(Clone)]
pub struct BlockingThreadScope {
    core: Arc<BlockingCore>,
}

impl std::fmt::Debug for BlockingThreadScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingThreadScope").finish_non_exhaustive()
    }
}

impl BlockingThreadScope {
    /// Resolve the value registered for `T` without suspending.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core)
    }

    /// Open a blocking task scope nested under this instance.
    pub fn task_scope(&self) -> Result<BlockingTaskScope> {
        Ok(BlockingTaskScope {
            core: open_child(&self.core, Scope::Task)?,
        })
    }

    /// Open a blocking factory scope under this instance.
    pub fn factory_scope(&self) -> Result<BlockingFactoryScope> {
        Ok(BlockingFactoryScope {
            core: open_child(&self.core, Scope::Factory)?,
        })
    }

    /// Enter a task scope, run `body`, close on every exit path.
    pub fn with_task_scope<F, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&BlockingTaskScope) -> Result<T>,
    {
        let scope = self.task_scope()?;
        let outcome = body(&scope);
        close_after(&scope.core, outcome)
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub fn close(&self) -> Result<()> {
        self.core.close()
    }
}

/// Blocking variant of the task scope.
#[derive(Clone)]
pub struct BlockingTaskScope {
    core: Arc<BlockingCore>,
}

impl BlockingTaskScope {
    /// Resolve the value registered for `T` without suspending.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core)
    }

    /// Open a blocking factory scope under this instance.
    pub fn factory_scope(&self) -> Result<BlockingFactoryScope> {
        Ok(BlockingFactoryScope {
            core: open_child(&self.core, Scope::Factory)?,
        })
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub fn close(&self) -> Result<()> {
        self.core.close()
    }
}

/// Blocking variant of the factory scope.
#[derive(Clone)]
pub struct BlockingFactoryScope {
    core: Arc<BlockingCore>,
}

impl BlockingFactoryScope {
    /// Resolve the value registered for `T` without suspending.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core)
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub fn close(&self) -> Result<()> {
        self.core.close()
    }
}
