//! Job state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Job status.
///
/// State transitions:
/// - Pending -> Initializing -> Finding -> Success
/// - Pending -> Initializing -> Finding -> Failure
/// - Pending -> Initializing -> Failure (setup could not acquire its resources)
///
/// Serialized as SCREAMING_SNAKE_CASE: PENDING / INITIALIZING / FINDING / SUCCESS / FAILURE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Created by `submit`, not yet picked up by a worker.
    Pending,

    /// A worker owns the job and is acquiring compute resources.
    Initializing,

    /// The estimator is running.
    Finding,

    /// Finished with a result.
    Success,

    /// Finished with an error.
    Failure,
}

impl JobStatus {
    /// Position in the lifecycle. Terminal states share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Initializing => 1,
            JobStatus::Finding => 2,
            JobStatus::Success | JobStatus::Failure => 3,
        }
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure)
    }

    /// The next non-terminal state, if any.
    ///
    /// Terminal states are entered through `complete` / `fail` only,
    /// because they must carry a result or an error.
    pub fn next_stage(self) -> Option<JobStatus> {
        match self {
            JobStatus::Pending => Some(JobStatus::Initializing),
            JobStatus::Initializing => Some(JobStatus::Finding),
            JobStatus::Finding | JobStatus::Success | JobStatus::Failure => None,
        }
    }

    /// Can a job in this state be finished with `outcome_status`?
    pub fn can_finish_as(self, outcome_status: JobStatus) -> bool {
        match outcome_status {
            JobStatus::Success => self == JobStatus::Finding,
            JobStatus::Failure => {
                matches!(self, JobStatus::Initializing | JobStatus::Finding)
            }
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Initializing => "INITIALIZING",
            JobStatus::Finding => "FINDING",
            JobStatus::Success => "SUCCESS",
            JobStatus::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
