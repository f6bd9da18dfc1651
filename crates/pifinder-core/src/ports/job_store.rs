//! JobStore port - ジョブ状態の正本（source of truth）
//!
//! JobStore は handle → JobRecord の対応を排他的に所有します。
//! submit 側と worker 側の両方から共有される唯一の可変リソースです。
//!
//! # 設計原則
//! - 状態遷移は transition / complete / fail を通してのみ行う
//! - 同じ handle に対する操作は線形化可能
//! - 読み出しはコピー（JobRecord の clone）を返す

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{JobError, JobId, JobPayload, JobRecord, JobStatus, PiEstimate};

/// Number of records per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub pending: usize,
    pub initializing: usize,
    pub finding: usize,
    pub success: usize,
    pub failure: usize,
}

impl JobCounts {
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Initializing => self.initializing += 1,
            JobStatus::Finding => self.finding += 1,
            JobStatus::Success => self.success += 1,
            JobStatus::Failure => self.failure += 1,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.pending + self.initializing + self.finding
    }

    pub fn total(&self) -> usize {
        self.in_flight() + self.success + self.failure
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Allocate a new handle and store a PENDING record for `payload`.
    async fn create(&self, payload: JobPayload) -> Result<JobId, JobError>;

    /// Copy of the current record.
    async fn get(&self, job_id: JobId) -> Result<JobRecord, JobError>;

    /// PENDING -> INITIALIZING on behalf of `worker_id`.
    ///
    /// Fails with `InvalidTransition` if another worker already claimed it.
    async fn claim(&self, job_id: JobId, worker_id: usize) -> Result<(), JobError>;

    /// Move to the next non-terminal status.
    async fn transition(&self, job_id: JobId, new_status: JobStatus) -> Result<(), JobError>;

    /// FINDING -> SUCCESS with the result.
    async fn complete(&self, job_id: JobId, result: PiEstimate) -> Result<(), JobError>;

    /// INITIALIZING | FINDING -> FAILURE with the error description.
    async fn fail(&self, job_id: JobId, error: String) -> Result<(), JobError>;

    /// Remove a record that never left PENDING (its dispatch failed).
    ///
    /// Returns `false` if the record was already claimed or does not exist.
    async fn discard(&self, job_id: JobId) -> Result<bool, JobError>;

    /// Drop terminal records that finished before `cutoff`. Returns how many were removed.
    async fn purge_finished_before(&self, cutoff: DateTime<Utc>) -> Result<usize, JobError>;

    async fn counts(&self) -> Result<JobCounts, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_split_in_flight_and_terminal() {
        let mut counts = JobCounts::default();
        counts.record(JobStatus::Pending);
        counts.record(JobStatus::Finding);
        counts.record(JobStatus::Success);
        counts.record(JobStatus::Failure);
        counts.record(JobStatus::Failure);

        assert_eq!(counts.in_flight(), 2);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.failure, 2);
    }
}
