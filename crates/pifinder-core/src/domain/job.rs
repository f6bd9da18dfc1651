//! Job record and status views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::JobError;
use super::ids::JobId;
use super::outcome::{Outcome, PiEstimate};
use super::payload::JobPayload;
use super::state::JobStatus;

/// Job record: the single source of truth for one job.
///
/// Design:
/// - State transitions via methods (not direct field access).
/// - `status` and `outcome` change together, so a terminal status always
///   carries exactly one of result / error and a non-terminal one carries none.
#[derive(Debug, Clone)]
pub struct JobRecord {
    job_id: JobId,
    payload: JobPayload,
    status: JobStatus,
    outcome: Option<Outcome>,

    /// Worker that claimed the job (set on PENDING -> INITIALIZING).
    worker_id: Option<usize>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(job_id: JobId, payload: JobPayload, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            payload,
            status: JobStatus::Pending,
            outcome: None,
            worker_id: None,
            created_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn payload(&self) -> JobPayload {
        self.payload
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn worker_id(&self) -> Option<usize> {
        self.worker_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Move to the next non-terminal stage.
    pub fn advance(&mut self, to: JobStatus, now: DateTime<Utc>) -> Result<(), JobError> {
        if self.status.next_stage() != Some(to) {
            return Err(self.invalid_transition(to));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// PENDING -> INITIALIZING, recording the owning worker.
    pub fn claim(&mut self, worker_id: usize, now: DateTime<Utc>) -> Result<(), JobError> {
        self.advance(JobStatus::Initializing, now)?;
        self.worker_id = Some(worker_id);
        Ok(())
    }

    /// Enter the terminal state matching `outcome`.
    pub fn finish(&mut self, outcome: Outcome, now: DateTime<Utc>) -> Result<(), JobError> {
        if self.status.is_terminal() {
            return Err(JobError::AlreadyTerminal(self.job_id));
        }
        let to = match outcome {
            Outcome::Success { .. } => JobStatus::Success,
            Outcome::Failure { .. } => JobStatus::Failure,
        };
        if !self.status.can_finish_as(to) {
            return Err(self.invalid_transition(to));
        }
        self.status = to;
        self.outcome = Some(outcome);
        self.updated_at = now;
        self.finished_at = Some(now);
        Ok(())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.job_id,
            status: self.status,
            payload: self.payload,
            result: self.outcome.as_ref().and_then(Outcome::result).copied(),
            error: self
                .outcome
                .as_ref()
                .and_then(Outcome::error)
                .map(str::to_string),
            worker_id: self.worker_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            finished_at: self.finished_at,
        }
    }

    fn invalid_transition(&self, to: JobStatus) -> JobError {
        JobError::InvalidTransition {
            job_id: self.job_id,
            from: self.status,
            to,
        }
    }
}

/// Serializable, point-in-time copy of a `JobRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub payload: JobPayload,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PiEstimate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<usize>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use ulid::Ulid;

    fn record() -> JobRecord {
        JobRecord::new(JobId::from_ulid(Ulid::new()), JobPayload::new(100), Utc::now())
    }

    fn estimate() -> PiEstimate {
        PiEstimate {
            pi: 3.12,
            niter: 100,
            duration_ms: 0,
        }
    }

    #[test]
    fn new_job_starts_as_pending() {
        let job = record();
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.outcome().is_none());
        assert!(job.worker_id().is_none());
    }

    #[test]
    fn full_lifecycle_to_success() {
        let mut job = record();
        job.claim(3, Utc::now()).unwrap();
        assert_eq!(job.worker_id(), Some(3));
        job.advance(JobStatus::Finding, Utc::now()).unwrap();
        job.finish(Outcome::success(estimate()), Utc::now()).unwrap();

        let snap = job.snapshot();
        assert_eq!(snap.status, JobStatus::Success);
        assert_eq!(snap.result, Some(estimate()));
        assert!(snap.error.is_none());
        assert!(snap.finished_at.is_some());
    }

    #[test]
    fn setup_failure_is_allowed() {
        let mut job = record();
        job.claim(0, Utc::now()).unwrap();
        job.finish(Outcome::failure("no memory"), Utc::now()).unwrap();

        let snap = job.snapshot();
        assert_eq!(snap.status, JobStatus::Failure);
        assert!(snap.result.is_none());
        assert_eq!(snap.error.as_deref(), Some("no memory"));
    }

    #[rstest]
    #[case::skip_initializing(JobStatus::Finding)]
    #[case::backwards(JobStatus::Pending)]
    #[case::terminal_via_advance(JobStatus::Success)]
    fn advance_rejects_out_of_order(#[case] to: JobStatus) {
        let mut job = record();
        let err = job.advance(to, Utc::now()).unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { from: JobStatus::Pending, .. }));
        assert_eq!(job.status(), JobStatus::Pending);
    }

    #[test]
    fn second_claim_fails() {
        let mut job = record();
        job.claim(0, Utc::now()).unwrap();
        let err = job.claim(1, Utc::now()).unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
        assert_eq!(job.worker_id(), Some(0));
    }

    #[test]
    fn success_before_finding_is_rejected() {
        let mut job = record();
        job.claim(0, Utc::now()).unwrap();
        let err = job.finish(Outcome::success(estimate()), Utc::now()).unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
        assert!(job.outcome().is_none());
    }

    #[test]
    fn finishing_twice_is_already_terminal() {
        let mut job = record();
        job.claim(0, Utc::now()).unwrap();
        job.advance(JobStatus::Finding, Utc::now()).unwrap();
        job.finish(Outcome::success(estimate()), Utc::now()).unwrap();

        let err = job.finish(Outcome::failure("late"), Utc::now()).unwrap_err();
        assert!(matches!(err, JobError::AlreadyTerminal(_)));
        assert_eq!(job.status(), JobStatus::Success);
        assert!(job.outcome().and_then(Outcome::error).is_none());
    }
}
