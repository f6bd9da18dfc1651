//! Estimator port - π の推定
//!
//! 二段階に分かれています:
//! 1. `prepare` - リソース確保（INITIALIZING 中に実行）
//! 2. `EstimateSession::run` - サンプリング本体（FINDING 中に実行）
//!
//! どちらも CPU バウンドなので、worker は blocking pool 上で呼び出します。

use crate::domain::{JobError, PiEstimate};

/// A prepared computation. Owns all the state it needs (including its RNG).
pub trait EstimateSession: Send {
    fn run(self: Box<Self>) -> Result<PiEstimate, JobError>;
}

/// Estimator は iterations から π の推定値を作る
///
/// # 設計原則
/// - 副作用なし
/// - 呼び出し間で可変な RNG を共有しない（セッションごとに独立）
pub trait Estimator: Send + Sync {
    /// Validate `iterations` and acquire what the run needs.
    ///
    /// Rejects `iterations <= 0` with `InvalidArgument`.
    fn prepare(
        &self,
        iterations: i64,
        seed: Option<u64>,
    ) -> Result<Box<dyn EstimateSession>, JobError>;
}
