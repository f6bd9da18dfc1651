//! App - アプリケーション層
//!
//! ports を組み合わせて submit / poll / 実行 / 保持期間管理を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder / App**: 構築とワイヤリング、停止
//! - **JobService**: submit / poll の公開契約
//! - **WorkerLoop / WorkerPool**: ジョブ実行（pop→claim→prepare→find→complete）
//! - **GcLoop**: 終了済みレコードの回収

pub mod builder;
pub mod gc_loop;
pub mod service;
pub mod status;
pub mod worker_loop;
pub mod worker_pool;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::gc_loop::GcLoop;
pub use self::service::{JobService, SweepError};
pub use self::status::PollResponse;
pub use self::worker_loop::WorkerLoop;
pub use self::worker_pool::WorkerPool;
