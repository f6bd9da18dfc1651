//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 実装は `impls` にあり、`app` は trait 経由でのみ利用します。
//!
//! # 設計原則
//! - JobStore が正本（状態・結果・エラー）
//! - DeliveryQueue は配送のみ（handle と payload）
//! - Estimator は純粋な計算

pub mod clock;
pub mod delivery_queue;
pub mod estimator;
pub mod id_generator;
pub mod job_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_queue::{Delivery, DeliveryQueue, QueueError};
pub use self::estimator::{EstimateSession, Estimator};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::job_store::{JobCounts, JobStore};
