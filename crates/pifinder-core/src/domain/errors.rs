//! Errors - エラー型と分類
//!
//! - submit 時のエラーは呼び出し元へ同期的に返す（InvalidArgument, QueueClosed, DispatchFailed）
//! - poll 時のエラーは NotFound のみ
//! - InvalidTransition / AlreadyTerminal は内部不変条件の違反（エンドユーザーには見せない）
//! - ComputationFailure は JobRecord に保存され、poll 経由でのみ見える

use thiserror::Error;

use super::ids::JobId;
use super::state::JobStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("invalid transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("job {0} is already terminal")]
    AlreadyTerminal(JobId),

    #[error("computation failed: {0}")]
    ComputationFailure(String),

    #[error("dispatch queue is closed")]
    QueueClosed,

    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
}

impl JobError {
    /// Invariant violations. Callers treat these as programming errors.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            JobError::InvalidTransition { .. } | JobError::AlreadyTerminal(_)
        )
    }
}
