//! Status - poll の返り値
//!
//! 3 種類の結果を取り違えないように分けて返す:
//! - まだ実行中（InProgress）
//! - 成功（Succeeded）/ アプリケーションレベルの失敗（Failed）
//! - handle が見つからない → これは `Err(JobError::NotFound)` で別経路

use serde::{Deserialize, Serialize};

use crate::domain::{JobId, JobRecord, JobStatus, Outcome, PiEstimate};

/// What a client sees when it polls a handle.
///
/// Serialized as `{"state": "IN_PROGRESS" | "SUCCEEDED" | "FAILED", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollResponse {
    InProgress { job_id: JobId, status: JobStatus },
    Succeeded { job_id: JobId, result: PiEstimate },
    Failed { job_id: JobId, error: String },
}

impl PollResponse {
    pub fn job_id(&self) -> JobId {
        match self {
            PollResponse::InProgress { job_id, .. }
            | PollResponse::Succeeded { job_id, .. }
            | PollResponse::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            PollResponse::InProgress { status, .. } => *status,
            PollResponse::Succeeded { .. } => JobStatus::Success,
            PollResponse::Failed { .. } => JobStatus::Failure,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollResponse::InProgress { .. })
    }
}

impl From<&JobRecord> for PollResponse {
    fn from(record: &JobRecord) -> Self {
        let job_id = record.job_id();
        match record.outcome() {
            Some(Outcome::Success { result }) => PollResponse::Succeeded {
                job_id,
                result: *result,
            },
            Some(Outcome::Failure { error }) => PollResponse::Failed {
                job_id,
                error: error.clone(),
            },
            None => PollResponse::InProgress {
                job_id,
                status: record.status(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobPayload;
    use chrono::Utc;
    use ulid::Ulid;

    fn record() -> JobRecord {
        JobRecord::new(JobId::from_ulid(Ulid::new()), JobPayload::new(10), Utc::now())
    }

    #[test]
    fn pending_record_is_in_progress() {
        let record = record();
        let response = PollResponse::from(&record);
        assert_eq!(response.status(), JobStatus::Pending);
        assert!(!response.is_terminal());
        assert_eq!(response.job_id(), record.job_id());
    }

    #[test]
    fn failed_record_is_failed() {
        let mut record = record();
        record.claim(0, Utc::now()).unwrap();
        record.finish(Outcome::failure("boom"), Utc::now()).unwrap();

        let response = PollResponse::from(&record);
        assert_eq!(
            response,
            PollResponse::Failed {
                job_id: record.job_id(),
                error: "boom".into()
            }
        );
        assert!(response.is_terminal());
    }

    #[test]
    fn response_is_tagged_by_state() {
        let response = PollResponse::InProgress {
            job_id: JobId::from_ulid(Ulid::new()),
            status: JobStatus::Finding,
        };
        let v = serde_json::to_value(&response).unwrap();
        assert_eq!(v["state"], "IN_PROGRESS");
        assert_eq!(v["status"], "FINDING");
    }
}
