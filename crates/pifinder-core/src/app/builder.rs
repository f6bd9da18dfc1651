//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - グローバルなシングルトンの代わりに、明示的に所有される App

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::gc_loop::GcLoop;
use super::service::JobService;
use super::worker_pool::WorkerPool;
use crate::config::AppConfig;
use crate::impls::{InMemoryDeliveryQueue, InMemoryJobStore, MonteCarloEstimator};
use crate::ports::{Clock, DeliveryQueue, Estimator, JobStore, SystemClock};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .config(AppConfig::default().with_workers(8))
///     .build()?;
/// let job_id = app.service().submit(JobPayload::new(1_000_000)).await?;
/// ```
///
/// 差し替えなかった部品はプロセス内実装（InMemory*、MonteCarloEstimator）になる。
pub struct AppBuilder {
    config: AppConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn JobStore>>,
    queue: Option<Arc<dyn DeliveryQueue>>,
    estimator: Option<Arc<dyn Estimator>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("at least one worker is required")]
    NoWorkers,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("retention {0:?} is out of range")]
    RetentionOutOfRange(Duration),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            clock: None,
            store: None,
            queue: None,
            estimator: None,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock for timestamps and retention. Also used by the default store.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn store(mut self, store: Arc<dyn JobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn estimator(mut self, estimator: Arc<dyn Estimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Validate the configuration, then start workers and the retention sweeper.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<App, BuildError> {
        let config = self.config;
        if config.workers == 0 {
            return Err(BuildError::NoWorkers);
        }
        if config.pop_timeout.is_zero() {
            return Err(BuildError::ZeroInterval("pop_timeout"));
        }
        if config.poll_interval.is_zero() {
            return Err(BuildError::ZeroInterval("poll_interval"));
        }
        let retention = match config.retention {
            Some(retention) => {
                if config.gc_interval.is_zero() {
                    return Err(BuildError::ZeroInterval("gc_interval"));
                }
                Some(
                    chrono::Duration::from_std(retention)
                        .map_err(|_| BuildError::RetentionOutOfRange(retention))?,
                )
            }
            None => None,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryJobStore::with_clock(Arc::clone(&clock))));
        let queue = self
            .queue
            .unwrap_or_else(|| Arc::new(InMemoryDeliveryQueue::new()));
        let estimator = self
            .estimator
            .unwrap_or_else(|| Arc::new(MonteCarloEstimator::new()));

        let service = JobService::new(Arc::clone(&store), Arc::clone(&queue), config.poll_interval);
        let workers = WorkerPool::spawn(
            config.workers,
            Arc::clone(&store),
            Arc::clone(&queue),
            estimator,
            config.pop_timeout,
        );

        let (gc_shutdown_tx, gc_shutdown_rx) = watch::channel(false);
        let gc = retention.map(|retention| {
            let gc = GcLoop::new(Arc::clone(&store), clock, retention, config.gc_interval);
            tokio::spawn(gc.run(gc_shutdown_rx))
        });

        Ok(App {
            service,
            queue,
            workers,
            gc,
            gc_shutdown_tx,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App はアプリケーションのランタイム
///
/// プロセス起動時に 1 度だけ構築し、終了時に `shutdown` / `drain` で畳む。
pub struct App {
    service: JobService,
    queue: Arc<dyn DeliveryQueue>,
    workers: WorkerPool,
    gc: Option<JoinHandle<()>>,
    gc_shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Handle for callers. Cheap to clone.
    pub fn service(&self) -> &JobService {
        &self.service
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting jobs, let in-flight jobs finish, and stop.
    /// Jobs still waiting in the queue stay PENDING.
    pub async fn shutdown(self) {
        self.queue.close().await;
        self.workers.request_shutdown();
        self.finish().await;
    }

    /// Stop accepting jobs and run everything already queued before stopping.
    pub async fn drain(self) {
        self.queue.close().await;
        self.finish().await;
    }

    async fn finish(self) {
        self.workers.join().await;
        let _ = self.gc_shutdown_tx.send(true);
        if let Some(gc) = self.gc
            && let Err(e) = gc.await
        {
            tracing::error!(error = %e, "Retention sweeper ended abnormally");
        }
        tracing::info!("App stopped");
    }
}
