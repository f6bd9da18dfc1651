//! MonteCarloEstimator - 単位正方形へのランダムサンプリングで π を推定
//!
//! 単位正方形 [0, 1)² に点を打ち、x² + y² <= 1（四分円の内側）に入った割合を 4 倍する。

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::payload::validate_iterations;
use crate::domain::{JobError, PiEstimate};
use crate::ports::{EstimateSession, Estimator};

#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloEstimator;

impl MonteCarloEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl Estimator for MonteCarloEstimator {
    fn prepare(
        &self,
        iterations: i64,
        seed: Option<u64>,
    ) -> Result<Box<dyn EstimateSession>, JobError> {
        let iterations = validate_iterations(iterations)?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Box::new(PiFinder { iterations, rng }))
    }
}

/// One sampling run with its own RNG.
struct PiFinder {
    iterations: u64,
    rng: StdRng,
}

impl EstimateSession for PiFinder {
    fn run(mut self: Box<Self>) -> Result<PiEstimate, JobError> {
        let started = Instant::now();
        let mut inside: u64 = 0;
        for _ in 0..self.iterations {
            let x: f64 = self.rng.gen_range(0.0..1.0);
            let y: f64 = self.rng.gen_range(0.0..1.0);
            if x * x + y * y <= 1.0 {
                inside += 1;
            }
        }
        Ok(PiEstimate {
            pi: 4.0 * inside as f64 / self.iterations as f64,
            niter: self.iterations,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Prepare and run in one call.
pub fn estimate(iterations: i64) -> Result<PiEstimate, JobError> {
    MonteCarloEstimator.prepare(iterations, None)?.run()
}
