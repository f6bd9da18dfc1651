//! Job payload: what the client asks to compute.

use serde::{Deserialize, Serialize};

use super::errors::JobError;

/// Default iteration count offered by the submission form.
pub const DEFAULT_ITERATIONS: u64 = 500_000_000;

/// Upper bound on the number of jobs a single sweep may create.
pub const MAX_SWEEP_JOBS: usize = 10_000;

/// Payload of a π job.
///
/// `niter` is whatever integer the client sent; non-positive counts are
/// rejected by `iterations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub niter: i64,

    /// Fixed RNG seed for a reproducible estimate. `None` draws fresh entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl JobPayload {
    pub fn new(niter: i64) -> Self {
        Self { niter, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse the `niter` form field as sent by the submission form.
    pub fn from_form(niter: Option<&str>) -> Result<Self, JobError> {
        let raw = niter
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| JobError::InvalidArgument("niter is required".to_string()))?;
        let niter = raw
            .parse::<i64>()
            .map_err(|_| JobError::InvalidArgument(format!("niter must be an integer, got {raw:?}")))?;
        Ok(Self::new(niter))
    }

    /// Validated iteration count.
    pub fn iterations(&self) -> Result<u64, JobError> {
        validate_iterations(self.niter)
    }
}

pub(crate) fn validate_iterations(niter: i64) -> Result<u64, JobError> {
    if niter <= 0 {
        return Err(JobError::InvalidArgument(format!(
            "niter must be a positive integer, got {niter}"
        )));
    }
    Ok(niter as u64)
}

/// An inclusive range of iteration counts, one job per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl SweepRange {
    pub fn new(min: i64, max: i64, step: i64) -> Self {
        Self { min, max, step }
    }

    /// Expand into one payload per iteration count.
    ///
    /// The whole range is validated before anything is returned.
    pub fn payloads(&self) -> Result<Vec<JobPayload>, JobError> {
        validate_iterations(self.min)?;
        if self.step <= 0 {
            return Err(JobError::InvalidArgument(format!(
                "step must be a positive integer, got {}",
                self.step
            )));
        }
        if self.max < self.min {
            return Err(JobError::InvalidArgument(format!(
                "max ({}) is smaller than min ({})",
                self.max, self.min
            )));
        }

        let count = ((self.max - self.min) / self.step) as usize + 1;
        if count > MAX_SWEEP_JOBS {
            return Err(JobError::InvalidArgument(format!(
                "sweep would create {count} jobs, limit is {MAX_SWEEP_JOBS}"
            )));
        }

        Ok((0..count as i64)
            .map(|i| JobPayload::new(self.min + i * self.step))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-5)]
    fn non_positive_iterations_are_rejected(#[case] niter: i64) {
        let err = JobPayload::new(niter).iterations().unwrap_err();
        assert!(matches!(err, JobError::InvalidArgument(_)));
    }

    #[test]
    fn positive_iterations_are_accepted() {
        assert_eq!(JobPayload::new(1000).iterations().unwrap(), 1000);
    }

    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(""))]
    #[case::not_a_number(Some("lots"))]
    #[case::float(Some("1.5"))]
    fn malformed_form_field(#[case] raw: Option<&str>) {
        let err = JobPayload::from_form(raw).unwrap_err();
        assert!(matches!(err, JobError::InvalidArgument(_)));
    }

    #[test]
    fn form_field_is_parsed() {
        let payload = JobPayload::from_form(Some(" 500000000 ")).unwrap();
        assert_eq!(payload, JobPayload::new(DEFAULT_ITERATIONS as i64));
    }

    #[test]
    fn payload_json_shape() {
        let v = serde_json::to_value(JobPayload::new(10)).unwrap();
        assert_eq!(v, serde_json::json!({"niter": 10}));

        let seeded: JobPayload = serde_json::from_str(r#"{"niter": 10, "seed": 7}"#).unwrap();
        assert_eq!(seeded, JobPayload::new(10).with_seed(7));
    }

    #[test]
    fn sweep_is_inclusive() {
        let niters: Vec<i64> = SweepRange::new(100, 300, 100)
            .payloads()
            .unwrap()
            .iter()
            .map(|p| p.niter)
            .collect();
        assert_eq!(niters, vec![100, 200, 300]);
    }

    #[rstest]
    #[case::zero_min(SweepRange::new(0, 10, 1))]
    #[case::zero_step(SweepRange::new(1, 10, 0))]
    #[case::inverted(SweepRange::new(10, 1, 1))]
    #[case::too_many(SweepRange::new(1, 1_000_000, 1))]
    fn invalid_sweeps(#[case] range: SweepRange) {
        assert!(matches!(range.payloads(), Err(JobError::InvalidArgument(_))));
    }
}
