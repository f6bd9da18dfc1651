//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryDeliveryQueue**: プロセス内の配送キュー
//! - **InMemoryJobStore**: プロセス内の正本
//! - **MonteCarloEstimator**: サンプリングによる π 推定
//!
//! Redis などの外部ブローカーに差し替える場合も ports の trait を実装するだけでよい。

pub mod inmem_delivery;
pub mod inmem_store;
pub mod monte_carlo;

// 主要な型を再エクスポート
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::inmem_store::InMemoryJobStore;
pub use self::monte_carlo::{MonteCarloEstimator, estimate};
