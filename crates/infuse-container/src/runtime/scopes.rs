//! Async scope instances
//!
//! The four scope types wrap a shared [`ScopeCore`] and differ only in
//! which child scopes they may open: application instances open thread,
//! task and factory scopes; thread instances open task and factory
//! scopes; task and factory instances open factory scopes. Every type is
//! cheaply cloneable; clones share one instance, so a `get` on any clone
//! observes the same cache.
//!
//! Explicit `close` pairs with entry. The `with_*` combinators enter a
//! child scope, run the body and close on every exit path; a teardown
//! failure never masks a body error already in flight.

use std::future::Future;
use std::sync::Arc;

use infuse_core::{Error, Key, Result, Scope};
use tracing::error;

use super::ScopeCore;
use crate::graph::Graph;

async fn get_from<T: Send + Sync + 'static>(core: &Arc<ScopeCore>) -> Result<Arc<T>> {
    let instance = Arc::clone(core).resolve(Key::of::<T>()).await?;
    instance.downcast::<T>().map_err(|_| {
        Error::construction(format!(
            "provider for {} produced a value of a different type",
            Key::of::<T>()
        ))
    })
}

async fn open_child(parent: &Arc<ScopeCore>, kind: Scope) -> Result<Arc<ScopeCore>> {
    if parent.is_closed() {
        return Err(Error::ScopeClosed);
    }
    let core = ScopeCore::new(kind, parent.graph(), Some(Arc::clone(parent)));
    core.enter().await?;
    Ok(core)
}

/// Run a scope body, then close the scope on every exit path. The body
/// error wins when both fail; teardown failures are still logged.
async fn close_after<T>(core: &Arc<ScopeCore>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => core.close().await.map(|()| value),
        Err(err) => {
            if let Err(teardown_err) = core.close().await {
                error!(error = %teardown_err, "teardown failures while unwinding failed scope body");
            }
            Err(err)
        }
    }
}

/// The outermost scope instance. Entry constructs application-tier eager
/// providers; exit tears down every application-owned resource.
#[derive(Clone)]
pub struct ApplicationScope {
    core: Arc<ScopeCore>,
}

impl ApplicationScope {
    pub(crate) async fn open(graph: Arc<Graph>) -> Result<Self> {
        let core = ScopeCore::new(Scope::Application, graph, None);
        core.enter().await?;
        Ok(Self { core })
    }

    /// Resolve the value registered for `T` within this scope chain.
    pub async fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core).await
    }

    /// Open a thread scope nested under this instance.
    pub async fn thread_scope(&self) -> Result<ThreadScope> {
        Ok(ThreadScope {
            core: open_child(&self.core, Scope::Thread).await?,
        })
    }

    /// Open a task scope directly under this instance (single-thread
    /// usage, no intermediate thread scope).
    pub async fn task_scope(&self) -> Result<TaskScope> {
        Ok(TaskScope {
            core: open_child(&self.core, Scope::Task).await?,
        })
    }

    /// Open an ad-hoc factory scope under this instance.
    pub async fn factory_scope(&self) -> Result<FactoryScope> {
        Ok(FactoryScope {
            core: open_child(&self.core, Scope::Factory).await?,
        })
    }

    /// Enter a thread scope, run `body`, close on every exit path.
    pub async fn with_thread_scope<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(ThreadScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = self.thread_scope().await?;
        let outcome = body(scope.clone()).await;
        close_after(&scope.core, outcome).await
    }

    /// Enter a task scope, run `body`, close on every exit path.
    pub async fn with_task_scope<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = self.task_scope().await?;
        let outcome = body(scope.clone()).await;
        close_after(&scope.core, outcome).await
    }

    /// Drain the teardown stack in reverse order and close the instance.
    /// A closed application scope cannot be re-entered.
    pub async fn close(&self) -> Result<()> {
        self.core.close().await
    }

    pub(crate) async fn finish<T>(&self, outcome: Result<T>) -> Result<T> {
        close_after(&self.core, outcome).await
    }
}

/// A scope instance for one worker thread's lifetime. Many may be live
/// concurrently under one application instance.
#[derive(Clone)]
pub struct ThreadScope {
    core: Arc<ScopeCore>,
}

impl ThreadScope {
    /// Resolve the value registered for `T` within this scope chain.
    pub async fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core).await
    }

    /// Open a task scope nested under this instance.
    pub async fn task_scope(&self) -> Result<TaskScope> {
        Ok(TaskScope {
            core: open_child(&self.core, Scope::Task).await?,
        })
    }

    /// Open an ad-hoc factory scope under this instance.
    pub async fn factory_scope(&self) -> Result<FactoryScope> {
        Ok(FactoryScope {
            core: open_child(&self.core, Scope::Factory).await?,
        })
    }

    /// Enter a task scope, run `body`, close on every exit path.
    pub async fn with_task_scope<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(TaskScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = self.task_scope().await?;
        let outcome = body(scope.clone()).await;
        close_after(&scope.core, outcome).await
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub async fn close(&self) -> Result<()> {
        self.core.close().await
    }
}

/// A scope instance for one logical task, typically one request. Many may
/// be live concurrently under one parent.
#[derive(Clone)]
pub struct TaskScope {
    core: Arc<ScopeCore>,
}

impl std::fmt::Debug for TaskScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScope").finish_non_exhaustive()
    }
}

impl TaskScope {
    /// Resolve the value registered for `T` within this scope chain.
    pub async fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core).await
    }

    /// Open an ad-hoc factory scope under this instance.
    pub async fn factory_scope(&self) -> Result<FactoryScope> {
        Ok(FactoryScope {
            core: open_child(&self.core, Scope::Factory).await?,
        })
    }

    /// Enter a factory scope, run `body`, close on every exit path.
    pub async fn with_factory_scope<F, Fut, T>(&self, body: F) -> Result<T>
    where
        F: FnOnce(FactoryScope) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = self.factory_scope().await?;
        let outcome = body(scope.clone()).await;
        close_after(&scope.core, outcome).await
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub async fn close(&self) -> Result<()> {
        self.core.close().await
    }
}

/// An ad-hoc scope instance, never a dependency source for other scopes.
#[derive(Clone)]
pub struct FactoryScope {
    core: Arc<ScopeCore>,
}

impl FactoryScope {
    /// Resolve the value registered for `T` within this scope chain.
    pub async fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        get_from(&self.core).await
    }

    /// Drain the teardown stack in reverse order and close the instance.
    pub async fn close(&self) -> Result<()> {
        self.core.close().await
    }
}
