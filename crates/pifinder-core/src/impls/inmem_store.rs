//! InMemoryJobStore - プロセス内の JobStore
//!
//! # 実装詳細
//! - HashMap<JobId, JobRecord> を 1 つの RwLock で保護
//! - すべての変更は write lock の中で完結する（ロックを跨いで await しない）
//! - poll は read lock だけで済む

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    JobError, JobId, JobPayload, JobRecord, JobStatus, Outcome, PiEstimate,
};
use crate::ports::{Clock, IdGenerator, JobCounts, JobStore, SystemClock, UlidGenerator};

pub struct InMemoryJobStore {
    records: RwLock<HashMap<JobId, JobRecord>>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            ids: Box::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
        }
    }

    /// Apply `f` to the record under the write lock.
    async fn update<F>(&self, job_id: JobId, f: F) -> Result<(), JobError>
    where
        F: FnOnce(&mut JobRecord, DateTime<Utc>) -> Result<(), JobError> + Send,
    {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&job_id)
            .ok_or(JobError::NotFound(job_id))?;
        f(record, self.clock.now())
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, payload: JobPayload) -> Result<JobId, JobError> {
        let mut records = self.records.write().await;

        // 生きている handle とは絶対に衝突させない
        let mut job_id = self.ids.generate_job_id();
        while records.contains_key(&job_id) {
            tracing::warn!(job_id = %job_id, "Handle collision, minting a new one");
            job_id = self.ids.generate_job_id();
        }

        records.insert(job_id, JobRecord::new(job_id, payload, self.clock.now()));
        Ok(job_id)
    }

    async fn get(&self, job_id: JobId) -> Result<JobRecord, JobError> {
        let records = self.records.read().await;
        records.get(&job_id).cloned().ok_or(JobError::NotFound(job_id))
    }

    async fn claim(&self, job_id: JobId, worker_id: usize) -> Result<(), JobError> {
        self.update(job_id, |record, now| record.claim(worker_id, now))
            .await
    }

    async fn transition(&self, job_id: JobId, new_status: JobStatus) -> Result<(), JobError> {
        self.update(job_id, |record, now| record.advance(new_status, now))
            .await
    }

    async fn complete(&self, job_id: JobId, result: PiEstimate) -> Result<(), JobError> {
        self.update(job_id, |record, now| {
            record.finish(Outcome::success(result), now)
        })
        .await
    }

    async fn fail(&self, job_id: JobId, error: String) -> Result<(), JobError> {
        self.update(job_id, |record, now| record.finish(Outcome::failure(error), now))
            .await
    }

    async fn discard(&self, job_id: JobId) -> Result<bool, JobError> {
        let mut records = self.records.write().await;
        match records.get(&job_id) {
            Some(record) if record.status() == JobStatus::Pending => {
                records.remove(&job_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, JobError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| match record.finished_at() {
            Some(finished_at) => finished_at >= cutoff,
            None => true,
        });
        Ok(before - records.len())
    }

    async fn counts(&self) -> Result<JobCounts, JobError> {
        let records = self.records.read().await;
        let mut counts = JobCounts::default();
        for record in records.values() {
            counts.record(record.status());
        }
        Ok(counts)
    }
}
