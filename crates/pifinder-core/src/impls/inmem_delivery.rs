//! InMemoryDeliveryQueue - プロセス内の配送キュー
//!
//! # 学習ポイント
//! - tokio::sync::Mutex + Notify による blocking pop
//! - `Notified::enable` で push と待機開始の間の通知取りこぼしを防ぐ
//! - close で待機中の全 worker を起こす

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::ports::{Delivery, DeliveryQueue, QueueError};

#[derive(Default)]
struct QueueState {
    items: VecDeque<Delivery>,
    closed: bool,
}

/// InMemoryDeliveryQueue は開発・単一プロセス用の配送キュー
///
/// # 使用例
/// ```ignore
/// let queue = InMemoryDeliveryQueue::new();
/// queue.push(delivery).await?;
/// let next = queue.pop(Duration::from_secs(5)).await?;
/// ```
pub struct InMemoryDeliveryQueue {
    state: Mutex<QueueState>,
    /// push / close 時の通知用
    notify: Notify,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn push(&self, delivery: Delivery) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(QueueError::Closed);
            }
            state.items.push_back(delivery);
        }
        // Notify outside the lock
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Delivery>, QueueError> {
        // 表現できないほど長い timeout は期限なしとして扱う
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        loop {
            // 中身を確認する前に待機を登録しておく
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if let Some(delivery) = state.items.pop_front() {
                    return Ok(Some(delivery));
                }
                if state.closed {
                    return Err(QueueError::Closed);
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }
}
