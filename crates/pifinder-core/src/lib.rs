//! pifinder-core
//!
//! π を Monte Carlo 法で推定する非同期ジョブ基盤。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, payload, state, job, outcome, errors）
//! - **ports**: 抽象化レイヤー（JobStore, DeliveryQueue, Estimator, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, service, worker_loop, worker_pool, gc_loop, status）
//! - **impls**: 実装（InMemoryJobStore, InMemoryDeliveryQueue, MonteCarloEstimator）
//! - **config**: 実行時設定
//!
//! Submitting returns a `job-<ULID>` handle immediately; the estimate is
//! computed by a background worker and read back with `poll`.

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{App, AppBuilder, BuildError, JobService, PollResponse, SweepError};
pub use config::AppConfig;
pub use domain::{JobError, JobId, JobPayload, JobSnapshot, JobStatus, PiEstimate, SweepRange};
