//! GcLoop - 終了済みジョブの回収
//!
//! # フロー
//! 1. 定期的に `finished_at < now - retention` の JobRecord を検索
//! 2. JobStore から削除（以降の poll は NotFound）
//!
//! 実行中（非終端）のジョブは対象外。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::JobError;
use crate::ports::{Clock, JobStore};

pub struct GcLoop {
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    retention: chrono::Duration,
    interval: Duration,
}

impl GcLoop {
    pub fn new(
        store: Arc<dyn JobStore>,
        clock: Arc<dyn Clock>,
        retention: chrono::Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            retention,
            interval,
        }
    }

    /// Purge once. Returns the number of removed records.
    pub async fn sweep_once(&self) -> Result<usize, JobError> {
        // 保持期間が暦の範囲を超えるなら、それより古いレコードは存在しない
        let Some(cutoff) = self.clock.now().checked_sub_signed(self.retention) else {
            return Ok(0);
        };
        let purged = self.store.purge_finished_before(cutoff).await?;
        if purged > 0 {
            tracing::debug!(purged, cutoff = %cutoff, "Purged finished jobs");
        }
        Ok(purged)
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!(error = %e, "Retention sweep failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobPayload, JobStatus};
    use crate::impls::InMemoryJobStore;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn sweep_purges_only_after_retention() {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryJobStore::with_clock(clock.clone()));

        let id = store.create(JobPayload::new(10)).await.unwrap();
        store.claim(id, 0).await.unwrap();
        store.transition(id, JobStatus::Finding).await.unwrap();
        store.fail(id, "boom".into()).await.unwrap();
        let running = store.create(JobPayload::new(10)).await.unwrap();

        let gc = GcLoop::new(
            store.clone(),
            clock.clone(),
            chrono::Duration::minutes(30),
            Duration::from_secs(60),
        );

        clock.advance(chrono::Duration::minutes(29));
        assert_eq!(gc.sweep_once().await.unwrap(), 0);
        assert!(store.get(id).await.is_ok());

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(gc.sweep_once().await.unwrap(), 1);
        assert!(store.get(id).await.is_err());
        assert!(store.get(running).await.is_ok());
    }

    #[tokio::test]
    async fn retention_beyond_calendar_range_purges_nothing() {
        let store = Arc::new(InMemoryJobStore::new());
        let id = store.create(JobPayload::new(10)).await.unwrap();
        store.claim(id, 0).await.unwrap();
        store.fail(id, "boom".into()).await.unwrap();

        let gc = GcLoop::new(
            store.clone(),
            Arc::new(crate::ports::SystemClock),
            chrono::Duration::days(1_000_000_000),
            Duration::from_millis(10),
        );
        assert_eq!(gc.sweep_once().await.unwrap(), 0);
        assert!(store.get(id).await.is_ok());

        // 初回 tick で落ちずに回り続ける
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(gc.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), join)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let gc = GcLoop::new(
            Arc::new(InMemoryJobStore::new()),
            Arc::new(crate::ports::SystemClock),
            chrono::Duration::hours(1),
            Duration::from_millis(10),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(gc.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), join)
            .await
            .unwrap()
            .unwrap();
    }
}
