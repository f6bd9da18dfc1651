//! Domain model (handles, payloads, state machine, records, outcomes, errors).

pub mod errors;
pub mod ids;
pub mod job;
pub mod outcome;
pub mod payload;
pub mod state;

pub use self::errors::JobError;
pub use self::ids::{JobId, ParseJobIdError};
pub use self::job::{JobRecord, JobSnapshot};
pub use self::outcome::{Outcome, PiEstimate};
pub use self::payload::{DEFAULT_ITERATIONS, JobPayload, MAX_SWEEP_JOBS, SweepRange};
pub use self::state::JobStatus;
