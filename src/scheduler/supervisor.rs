//! Scheduler supervisor: owns the input monitor, output monitor, and worker
//! pool as a unit; runs a periodic store health check and stops the whole
//! unit once 3 consecutive checks fail.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::db::connection::DatabasePool;
use crate::scheduler::input_monitor::{InputMonitor, InputMonitorConfig};
use crate::scheduler::output_monitor::{OutputMonitor, OutputMonitorConfig};
use crate::worker_pool::{WorkerPool, WorkerPoolConfig};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub struct SchedulerSupervisor {
    pool: DatabasePool,
    worker_binary: PathBuf,
    config: ServerConfig,
    worker_pool: Arc<tokio::sync::Mutex<Option<Arc<WorkerPool>>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    input_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    output_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    failures: AtomicU32,
}

async fn health_check(pool: &DatabasePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

impl SchedulerSupervisor {
    pub fn new(pool: DatabasePool, worker_binary: PathBuf, config: ServerConfig) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Arc::new(Self {
            pool,
            worker_binary,
            config,
            worker_pool: Arc::new(tokio::sync::Mutex::new(None)),
            shutdown_tx,
            shutdown_rx,
            input_handle: tokio::sync::Mutex::new(None),
            output_handle: tokio::sync::Mutex::new(None),
            failures: AtomicU32::new(0),
        })
    }

    /// Verifies store connectivity, then starts components in order: worker
    /// pool, input monitor, output monitor, health-check loop.
    pub async fn start(self: &Arc<Self>) -> crate::Result<()> {
        health_check(&self.pool)
            .await
            .map_err(|e| crate::Error::Scheduler(format!("store connectivity check failed: {e}")))?;

        let worker_pool = self.build_worker_pool().await?;
        *self.worker_pool.lock().await = Some(worker_pool.clone());

        *self.input_handle.lock().await = Some(self.spawn_input_monitor(worker_pool.clone()));
        *self.output_handle.lock().await = Some(self.spawn_output_monitor(worker_pool));

        let health_check = self.clone();
        tokio::spawn(async move { health_check.health_check_loop().await });

        info!("scheduler started");
        Ok(())
    }

    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.output_handle.lock().await.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.input_handle.lock().await.take() {
            let _ = handle.await;
        }
        if let Some(pool) = self.worker_pool.lock().await.take() {
            pool.shutdown().await;
        }
        info!("scheduler stopped");
    }

    async fn build_worker_pool(&self) -> crate::Result<Arc<WorkerPool>> {
        let wp_config = &self.config.worker_pool;
        WorkerPool::start(WorkerPoolConfig {
            worker_binary: self.worker_binary.clone(),
            min_workers: wp_config.min_workers,
            max_workers: wp_config.resolved_max_workers(),
            thread_cap: wp_config.thread_cap,
            queue_capacity: wp_config.queue_capacity,
            scale_up_avg_threads: wp_config.scale_up_avg_threads,
            scale_down_avg_threads: wp_config.scale_down_avg_threads,
            scale_down_cpu_percent: wp_config.scale_down_cpu_percent,
        })
        .await
        .map_err(|e| crate::Error::Scheduler(format!("failed to start worker pool: {e}")))
    }

    fn spawn_input_monitor(&self, worker_pool: Arc<WorkerPool>) -> JoinHandle<()> {
        let monitor = InputMonitor::new(
            self.pool.clone(),
            worker_pool,
            InputMonitorConfig {
                poll_interval: Duration::from_millis(self.config.monitor.input_poll_interval_ms),
                batch_size: self.config.monitor.input_batch_size,
            },
        );
        let shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move { monitor.run(shutdown).await })
    }

    fn spawn_output_monitor(&self, worker_pool: Arc<WorkerPool>) -> JoinHandle<()> {
        let monitor = OutputMonitor::new(
            self.pool.clone(),
            worker_pool,
            OutputMonitorConfig {
                poll_min: Duration::from_millis(self.config.monitor.output_poll_min_ms),
                poll_max: Duration::from_millis(self.config.monitor.output_poll_max_ms),
                batch_size: self.config.monitor.output_batch_size,
            },
        );
        let shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move { monitor.run(shutdown).await })
    }

    async fn health_check_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEALTH_CHECK_INTERVAL) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
            if *shutdown.borrow() {
                return;
            }

            if health_check(&self.pool).await.is_err() {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(failures, "scheduler health check failed");
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    error!("scheduler exceeded consecutive health-check failures, stopping");
                    self.stop().await;
                    return;
                }
            } else {
                self.failures.store(0, Ordering::SeqCst);
            }
        }
    }
}
