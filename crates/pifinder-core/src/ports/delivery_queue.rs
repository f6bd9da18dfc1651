//! DeliveryQueue port - 配送キュー
//!
//! submit から worker pool への受け渡し路です。
//! submit のレイテンシと計算のレイテンシを切り離します。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{JobId, JobPayload};

/// One unit of work handed to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub job_id: JobId,
    pub payload: JobPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

/// DeliveryQueue は Delivery を worker に配送するためのキュー
///
/// # 設計原則
/// - 厳密な FIFO は要求しない（空いている worker が先に取る）
/// - blocking pop（timeout 付き）
/// - close 後の push は `Closed`、pop は残りを返し切ってから `Closed`
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn push(&self, delivery: Delivery) -> Result<(), QueueError>;

    /// Wait up to `timeout` for the next delivery. `Ok(None)` on timeout,
    /// `Err(QueueError::Closed)` once the queue is closed and drained.
    async fn pop(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError>;

    /// Stop accepting new deliveries and wake every waiting consumer.
    async fn close(&self);

    async fn len(&self) -> usize;
}
