//! JobService - submit / poll の公開契約
//!
//! HTTP 層などの呼び出し元はこの型だけを使う。
//! - `submit` はハンドルを即座に返す（計算の完了を待たない）
//! - `poll` は現在のスナップショットを即座に返す（ブロックしない）

use std::sync::Arc;
use std::time::Duration;

use super::status::PollResponse;
use crate::domain::{JobError, JobId, JobPayload, JobSnapshot, SweepRange};
use crate::ports::{Delivery, DeliveryQueue, JobCounts, JobStore, QueueError};

/// A sweep that stopped partway.
///
/// Jobs listed in `submitted` were accepted before the failure and will run;
/// poll them like any other handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sweep stopped after {} submitted job(s): {source}", .submitted.len())]
pub struct SweepError {
    pub submitted: Vec<JobId>,
    pub source: JobError,
}

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn DeliveryQueue>,
    poll_interval: Duration,
}

impl JobService {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn DeliveryQueue>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            poll_interval,
        }
    }

    /// Validate, record as PENDING, enqueue, and return the handle.
    ///
    /// Malformed payloads fail with `InvalidArgument` before any record exists.
    pub async fn submit(&self, payload: JobPayload) -> Result<JobId, JobError> {
        payload.iterations()?;

        let job_id = self.store.create(payload).await?;
        if let Err(e) = self.queue.push(Delivery { job_id, payload }).await {
            // 配送できなかったジョブは記録ごと取り消す
            if let Err(discard_err) = self.store.discard(job_id).await {
                tracing::error!(job_id = %job_id, error = %discard_err, "Failed to discard undelivered job");
            }
            tracing::warn!(job_id = %job_id, error = %e, "Submit rejected by dispatch queue");
            return Err(match e {
                QueueError::Closed => JobError::QueueClosed,
                QueueError::OperationFailed(msg) => JobError::DispatchFailed(msg),
            });
        }

        tracing::info!(job_id = %job_id, niter = payload.niter, "Job submitted");
        Ok(job_id)
    }

    /// Submit one job per iteration count in `range`.
    ///
    /// The whole range is validated first; nothing is created for an invalid one.
    /// If a submit fails partway, the handles accepted so far come back in the error.
    pub async fn submit_sweep(&self, range: SweepRange) -> Result<Vec<JobId>, SweepError> {
        let payloads = range.payloads().map_err(|source| SweepError {
            submitted: Vec::new(),
            source,
        })?;
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            match self.submit(payload).await {
                Ok(job_id) => ids.push(job_id),
                Err(source) => {
                    tracing::warn!(submitted = ids.len(), error = %source, "Sweep stopped early");
                    return Err(SweepError {
                        submitted: ids,
                        source,
                    });
                }
            }
        }
        Ok(ids)
    }

    /// Current state of `job_id`. Never waits for the job.
    pub async fn poll(&self, job_id: JobId) -> Result<PollResponse, JobError> {
        let record = self.store.get(job_id).await?;
        Ok(PollResponse::from(&record))
    }

    /// Full record copy, timestamps included.
    pub async fn snapshot(&self, job_id: JobId) -> Result<JobSnapshot, JobError> {
        Ok(self.store.get(job_id).await?.snapshot())
    }

    /// Long-poll: re-check until the job is terminal or `timeout` elapses,
    /// then return the latest state. A timeout too large to represent waits
    /// without a deadline.
    pub async fn wait(&self, job_id: JobId, timeout: Duration) -> Result<PollResponse, JobError> {
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        loop {
            let response = self.poll(job_id).await?;
            let now = tokio::time::Instant::now();
            if response.is_terminal() || deadline.is_some_and(|d| now >= d) {
                return Ok(response);
            }
            let pause = match deadline {
                Some(d) => self.poll_interval.min(d.saturating_duration_since(now)),
                None => self.poll_interval,
            };
            tokio::time::sleep(pause).await;
        }
    }

    pub async fn counts(&self) -> Result<JobCounts, JobError> {
        self.store.counts().await
    }
}
