//! WorkerPool - worker の起動と停止
//!
//! N 本の WorkerLoop が 1 つの DeliveryQueue と JobStore を共有する。
//! 停止は watch channel で一斉に通知する。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::worker_loop::WorkerLoop;
use crate::ports::{DeliveryQueue, Estimator, JobStore};

/// Worker pool handle.
/// - `request_shutdown()` で全 worker が新しいジョブを取らなくなる
/// - `join()` で全 worker の終了を待てる
pub struct WorkerPool {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `n` workers sharing one queue and one store.
    pub fn spawn(
        n: usize,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn DeliveryQueue>,
        estimator: Arc<dyn Estimator>,
        pop_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let worker = WorkerLoop::new(
                worker_id,
                Arc::clone(&store),
                Arc::clone(&queue),
                Arc::clone(&estimator),
                pop_timeout,
            );
            joins.push(tokio::spawn(worker.run(shutdown_rx.clone())));
        }
        tracing::info!(workers = n, "Worker pool started");

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Request shutdown for all workers.
    /// In-flight jobs are finished; queued ones are left untouched.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for j in self.joins {
            if let Err(e) = j.await {
                tracing::error!(error = %e, "Worker task ended abnormally");
            }
        }
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        self.join().await;
    }
}
