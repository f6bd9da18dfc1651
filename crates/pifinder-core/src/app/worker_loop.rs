//! WorkerLoop - ジョブ実行ループ
//!
//! # フロー
//! 1. DeliveryQueue::pop() で Delivery を取得
//! 2. JobStore::claim() で PENDING -> INITIALIZING（所有権の取得）
//! 3. Estimator::prepare() でリソース確保
//! 4. JobStore::transition() で INITIALIZING -> FINDING
//! 5. EstimateSession::run() で計算
//! 6. JobStore::complete() / fail() で終端状態と結果を同時に書き込む
//!
//! 計算のエラーは JobRecord に保存するだけで、worker は止めない。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::{JobError, JobId, JobStatus, PiEstimate};
use crate::ports::{Delivery, DeliveryQueue, Estimator, JobStore, QueueError};

/// WorkerLoop は 1 度に 1 件ずつジョブを最後まで処理する
pub struct WorkerLoop {
    worker_id: usize,
    store: Arc<dyn JobStore>,
    queue: Arc<dyn DeliveryQueue>,
    estimator: Arc<dyn Estimator>,
    pop_timeout: Duration,
}

impl WorkerLoop {
    pub fn new(
        worker_id: usize,
        store: Arc<dyn JobStore>,
        queue: Arc<dyn DeliveryQueue>,
        estimator: Arc<dyn Estimator>,
        pop_timeout: Duration,
    ) -> Self {
        Self {
            worker_id,
            store,
            queue,
            estimator,
            pop_timeout,
        }
    }

    /// Run until shutdown is requested or the queue is closed and drained.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let worker_id = self.worker_id;
        tracing::debug!(worker_id, "Worker started");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // pop は「待つ」可能性があるので select で shutdown と競合させる
            let popped = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        // sender dropped
                        break;
                    }
                    continue;
                }
                popped = self.queue.pop(self.pop_timeout) => popped,
            };

            match popped {
                Ok(Some(delivery)) => self.process(delivery).await,
                Ok(None) => continue,
                Err(QueueError::Closed) => break,
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "Queue pop failed");
                    tokio::time::sleep(self.pop_timeout).await;
                }
            }
        }

        tracing::debug!(worker_id, "Worker stopped");
    }

    /// Drive one job to a terminal state.
    pub async fn process(&self, delivery: Delivery) {
        let worker_id = self.worker_id;
        let job_id = delivery.job_id;

        if let Err(e) = self.store.claim(job_id, worker_id).await {
            tracing::error!(worker_id, job_id = %job_id, error = %e, "Failed to claim job");
            return;
        }
        tracing::info!(worker_id, job_id = %job_id, niter = delivery.payload.niter, "Job initializing");

        let estimator = Arc::clone(&self.estimator);
        let payload = delivery.payload;
        let session =
            match run_blocking(move || estimator.prepare(payload.niter, payload.seed)).await {
                Ok(session) => session,
                Err(e) => {
                    self.record_failure(job_id, e).await;
                    return;
                }
            };

        if let Err(e) = self.store.transition(job_id, JobStatus::Finding).await {
            tracing::error!(worker_id, job_id = %job_id, error = %e, "Failed to enter FINDING");
            return;
        }
        tracing::debug!(worker_id, job_id = %job_id, "Job finding");

        match run_blocking(move || session.run()).await {
            Ok(result) => self.record_success(job_id, result).await,
            Err(e) => self.record_failure(job_id, e).await,
        }
    }

    async fn record_success(&self, job_id: JobId, result: PiEstimate) {
        let worker_id = self.worker_id;
        match self.store.complete(job_id, result).await {
            Ok(()) => tracing::info!(
                worker_id,
                job_id = %job_id,
                pi = result.pi,
                niter = result.niter,
                duration_ms = result.duration_ms,
                "Job succeeded"
            ),
            Err(e) => {
                tracing::error!(worker_id, job_id = %job_id, error = %e, "Failed to store result")
            }
        }
    }

    async fn record_failure(&self, job_id: JobId, error: JobError) {
        let worker_id = self.worker_id;
        tracing::warn!(worker_id, job_id = %job_id, error = %error, "Job failed");
        if let Err(e) = self.store.fail(job_id, error.to_string()).await {
            tracing::error!(worker_id, job_id = %job_id, error = %e, "Failed to store error");
        }
    }
}

/// Run CPU-bound estimator code on the blocking pool. A panic becomes a
/// `ComputationFailure` instead of taking the worker down.
async fn run_blocking<T, F>(f: F) -> Result<T, JobError>
where
    F: FnOnce() -> Result<T, JobError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| JobError::ComputationFailure(format!("estimator task aborted: {e}")))?
}
