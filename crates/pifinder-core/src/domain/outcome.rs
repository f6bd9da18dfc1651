//! Outcome model: the terminal result of a job.
//!
//! A job that finished is either `Success` with a `PiEstimate` or `Failure`
//! with an error description. Never both, never neither.

use serde::{Deserialize, Serialize};

/// Result of one π estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PiEstimate {
    pub pi: f64,

    /// Iterations actually sampled.
    pub niter: u64,

    /// Wall time spent sampling (setup excluded).
    pub duration_ms: u64,
}

impl PiEstimate {
    /// Absolute distance from `std::f64::consts::PI`.
    pub fn error(&self) -> f64 {
        (self.pi - std::f64::consts::PI).abs()
    }
}

/// Terminal branch of a job.
///
/// We serialize as `{"kind": "SUCCESS", ...}` / `{"kind": "FAILURE", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success { result: PiEstimate },
    Failure { error: String },
}

impl Outcome {
    pub fn success(result: PiEstimate) -> Self {
        Outcome::Success { result }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Outcome::Failure {
            error: error.into(),
        }
    }

    pub fn result(&self) -> Option<&PiEstimate> {
        match self {
            Outcome::Success { result } => Some(result),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_tagged_enum() {
        let o = Outcome::failure("boom");
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["kind"], "FAILURE");
        assert_eq!(v["error"], "boom");

        let o = Outcome::success(PiEstimate {
            pi: 3.14,
            niter: 100,
            duration_ms: 1,
        });
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["kind"], "SUCCESS");
        assert_eq!(v["result"]["niter"], 100);
    }

    #[test]
    fn accessors_are_exclusive() {
        let ok = Outcome::success(PiEstimate {
            pi: 3.0,
            niter: 1,
            duration_ms: 0,
        });
        assert!(ok.result().is_some());
        assert!(ok.error().is_none());

        let failed = Outcome::failure("nope");
        assert!(failed.result().is_none());
        assert_eq!(failed.error(), Some("nope"));
    }
}
