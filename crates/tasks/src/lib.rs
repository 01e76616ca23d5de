//! A thin abstraction over "where does this piece of work run" so sync components never call
//! `tokio::task::spawn`/`spawn_blocking` directly, mirroring the upstream client's own task
//! executor handle. The main reason to have this instead of calling tokio directly: tests can
//! swap in an inline spawner and run every task on the calling thread, deterministically.

use std::future::Future;
use tokio::task::JoinHandle;

/// Dispatches async and CPU-bound work. Async sync-component loops hold a `Box<dyn TaskSpawner>`
/// (or a concrete type behind a generic) rather than touching `tokio::spawn` directly.
pub trait TaskSpawner: Send + Sync + std::fmt::Debug {
    /// Spawns a future onto the async runtime.
    fn spawn(&self, fut: std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) -> JoinHandle<()>;

    /// Spawns a blocking closure onto a dedicated worker pool — the offload path §5 requires for
    /// batch trie decode/verify and receipt-root computation so the event loop stays responsive.
    fn spawn_blocking<F>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static;
}

/// The production spawner: delegates straight to the ambient `tokio` runtime handle.
#[derive(Clone, Debug)]
pub struct TokioTaskSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioTaskSpawner {
    /// Captures the handle of the runtime this is constructed on.
    pub fn current() -> Self {
        Self { handle: tokio::runtime::Handle::current() }
    }
}

impl TaskSpawner for TokioTaskSpawner {
    fn spawn(&self, fut: std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) -> JoinHandle<()> {
        self.handle.spawn(fut)
    }

    fn spawn_blocking<F>(&self, f: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn_blocking(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_runs_the_future() {
        let spawner = TokioTaskSpawner::current();
        let (tx, rx) = tokio::sync::oneshot::channel();
        spawner.spawn(Box::pin(async move {
            let _ = tx.send(42);
        }));
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn spawn_blocking_runs_the_closure() {
        let spawner = TokioTaskSpawner::current();
        let (tx, rx) = std::sync::mpsc::channel();
        spawner.spawn_blocking(move || {
            tx.send(7).unwrap();
        });
        tokio::task::yield_now().await;
        // spawn_blocking dispatches onto a separate pool; give it a moment to run.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(rx.try_recv().unwrap(), 7);
    }
}
