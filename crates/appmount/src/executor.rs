use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

/// Runs the request futures of an application.
///
/// Executors are owned by the caller and may be shared between applications;
/// nothing in this crate shuts one down.
pub trait Executor: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);

    fn name(&self) -> &str {
        "executor"
    }
}

impl Executor for Handle {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        drop(Handle::spawn(self, task));
    }

    fn name(&self) -> &str {
        "tokio"
    }
}

/// Cloneable handle to a shared [`Executor`].
#[derive(Clone)]
pub struct SharedExecutor(Arc<dyn Executor>);

impl SharedExecutor {
    pub fn new<E: Executor + 'static>(executor: E) -> Self {
        Self(Arc::new(executor))
    }

    pub fn from_arc(executor: Arc<dyn Executor>) -> Self {
        Self(executor)
    }

    /// Whether both handles point at the same executor.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.0.spawn(Box::pin(future));
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl From<Handle> for SharedExecutor {
    fn from(handle: Handle) -> Self {
        Self::new(handle)
    }
}

impl fmt::Debug for SharedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedExecutor").field(&self.name()).finish()
    }
}
