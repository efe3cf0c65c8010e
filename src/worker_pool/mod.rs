//! Auto-scaling pool of worker processes. The pool supervisor lives in the
//! orchestrator process; each [`Worker`] is a child `flowctl-worker` process
//! reached over a tagged stdin/stdout protocol.

pub mod protocol;
pub mod queue;
pub mod worker;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

pub use protocol::{TaskOutput, TaskPayload, TaskStatus};
use queue::BoundedQueue;
use worker::Worker;

const HEALTH_POLL_TIMEOUT: Duration = Duration::from_millis(50);
const PERIODIC_HEALTH_POLL_TIMEOUT: Duration = Duration::from_millis(200);
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_binary: PathBuf,
    pub min_workers: usize,
    pub max_workers: usize,
    pub thread_cap: usize,
    pub queue_capacity: usize,
    pub scale_up_avg_threads: f64,
    pub scale_down_avg_threads: f64,
    pub scale_down_cpu_percent: f64,
}

pub struct WorkerPool {
    config: WorkerPoolConfig,
    workers: RwLock<Vec<Arc<Worker>>>,
    next_worker_id: AtomicUsize,
    round_robin_cursor: AtomicUsize,
    input_queue: Arc<BoundedQueue<TaskPayload>>,
    output_queue: Arc<BoundedQueue<TaskOutput>>,
    shutting_down: std::sync::atomic::AtomicBool,
}

impl WorkerPool {
    pub async fn start(config: WorkerPoolConfig) -> std::io::Result<Arc<Self>> {
        let pool = Arc::new(Self {
            input_queue: Arc::new(BoundedQueue::new(config.queue_capacity)),
            output_queue: Arc::new(BoundedQueue::new(config.queue_capacity)),
            workers: RwLock::new(Vec::new()),
            next_worker_id: AtomicUsize::new(0),
            round_robin_cursor: AtomicUsize::new(0),
            shutting_down: std::sync::atomic::AtomicBool::new(false),
            config,
        });

        for _ in 0..pool.config.min_workers {
            pool.spawn_worker().await?;
        }

        let scaler = pool.clone();
        tokio::spawn(async move { scaler.autoscale_loop().await });

        let dispatcher = pool.clone();
        tokio::spawn(async move { dispatcher.dispatch_loop().await });

        Ok(pool)
    }

    async fn spawn_worker(&self) -> std::io::Result<()> {
        let index = self.next_worker_id.fetch_add(1, Ordering::SeqCst);
        let worker = Worker::spawn(index, &self.config.worker_binary, self.output_queue.clone()).await?;
        self.workers.write().push(worker);
        info!(index, "worker started");
        Ok(())
    }

    pub fn active_worker_count(&self) -> usize {
        self.workers.read().len()
    }

    /// Enqueues a single payload for dispatch. Failure means the queue is
    /// saturated; the caller (the input monitor) must leave its task row
    /// untouched so the next poll cycle retries.
    pub fn submit(&self, payload: TaskPayload) -> Result<(), TaskPayload> {
        self.input_queue.put_nowait(payload)
    }

    /// All-or-nothing bulk submit: the caller retries the whole batch on
    /// rejection rather than deleting any task rows.
    pub fn submit_bulk(&self, payloads: Vec<TaskPayload>) -> Result<(), Vec<TaskPayload>> {
        self.input_queue.put_bulk(payloads)
    }

    pub async fn pop_output(&self, timeout: Duration) -> Option<TaskOutput> {
        self.output_queue.get_with_timeout(timeout).await
    }

    pub fn pop_output_bulk(&self, max: usize) -> Vec<TaskOutput> {
        self.output_queue.pop_bulk(max)
    }

    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let workers: Vec<_> = self.workers.write().drain(..).collect();
        for worker in workers {
            worker.shutdown().await;
        }
    }

    /// Dispatch policy: smallest current thread count wins, ties
    /// broken by index; round-robin fallback once every worker is at the
    /// per-worker thread cap. If nothing is up, the payload goes back to
    /// the tail of the input queue rather than being dropped.
    async fn dispatch_loop(self: Arc<Self>) {
        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                return;
            }
            let Some(payload) = self.input_queue.get_with_timeout(Duration::from_millis(200)).await else {
                continue;
            };

            match self.pick_worker().await {
                Some(worker) => {
                    if let Err(e) = worker.submit(payload).await {
                        warn!(worker = worker.index, error = %e, "dispatch failed, requeueing");
                    }
                }
                None => {
                    let _ = self.input_queue.put_nowait(payload);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    async fn pick_worker(&self) -> Option<Arc<Worker>> {
        let workers: Vec<_> = self.workers.read().iter().filter(|w| w.is_alive()).cloned().collect();
        if workers.is_empty() {
            return None;
        }

        let mut best: Option<&Arc<Worker>> = None;
        let mut all_saturated = true;
        for w in &workers {
            let count = w.thread_count();
            if count < self.config.thread_cap {
                all_saturated = false;
            }
            if best.map(|b| count < b.thread_count()).unwrap_or(true) {
                best = Some(w);
            }
        }

        if !all_saturated {
            return best.cloned();
        }

        debug!("worker pool saturated, falling back to round-robin dispatch");
        let cursor = self.round_robin_cursor.fetch_add(1, Ordering::SeqCst) % workers.len();
        Some(workers[cursor].clone())
    }

    /// Samples CPU% and per-worker thread counts every second and applies
    /// the scale-up/scale-down policy.
    async fn autoscale_loop(self: Arc<Self>) {
        let mut cpu_sampler = cpu::CpuSampler::new();
        loop {
            tokio::time::sleep(SAMPLE_INTERVAL).await;
            if self.shutting_down.load(Ordering::SeqCst) {
                return;
            }

            let workers = self.workers.read().clone();
            if workers.is_empty() {
                continue;
            }

            let mut samples = Vec::with_capacity(workers.len());
            for w in &workers {
                let timeout = if samples.is_empty() { HEALTH_POLL_TIMEOUT } else { PERIODIC_HEALTH_POLL_TIMEOUT };
                samples.push(w.query_thread_count(timeout).await);
            }
            let known: Vec<usize> = samples.into_iter().flatten().collect();
            if known.is_empty() {
                continue;
            }
            let avg_threads = known.iter().sum::<usize>() as f64 / known.len() as f64;
            let cpu_percent = cpu_sampler.sample_percent();
            let active = self.active_worker_count();

            if active < self.config.max_workers && avg_threads > self.config.scale_up_avg_threads {
                if let Err(e) = self.spawn_worker().await {
                    warn!(error = %e, "failed to scale up worker pool");
                }
                continue;
            }

            if active > self.config.min_workers
                && cpu_percent < self.config.scale_down_cpu_percent
                && avg_threads < self.config.scale_down_avg_threads
            {
                self.scale_down_tail().await;
            }
        }
    }

    async fn scale_down_tail(&self) {
        let victim = self.workers.write().pop();
        if let Some(victim) = victim {
            info!(index = victim.index, "scaling down worker pool");
            victim.shutdown().await;
        }
    }
}

mod cpu {
    /// Coarse CPU% sampler. On Linux, reads `/proc/stat` deltas between
    /// samples; elsewhere there is no portable zero-dependency source, so it
    /// always reports 0% (auto-scaling then degrades to thread-count-only).
    pub struct CpuSampler {
        #[cfg(target_os = "linux")]
        previous: Option<(u64, u64)>,
    }

    impl CpuSampler {
        pub fn new() -> Self {
            Self {
                #[cfg(target_os = "linux")]
                previous: None,
            }
        }

        #[cfg(target_os = "linux")]
        pub fn sample_percent(&mut self) -> f64 {
            let Ok(contents) = std::fs::read_to_string("/proc/stat") else {
                return 0.0;
            };
            let Some(line) = contents.lines().next() else {
                return 0.0;
            };
            let fields: Vec<u64> = line
                .split_whitespace()
                .skip(1)
                .filter_map(|f| f.parse().ok())
                .collect();
            if fields.len() < 4 {
                return 0.0;
            }
            let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
            let total: u64 = fields.iter().sum();

            let percent = match self.previous {
                Some((prev_idle, prev_total)) => {
                    let idle_delta = idle.saturating_sub(prev_idle) as f64;
                    let total_delta = total.saturating_sub(prev_total) as f64;
                    if total_delta <= 0.0 {
                        0.0
                    } else {
                        (1.0 - idle_delta / total_delta) * 100.0
                    }
                }
                None => 0.0,
            };
            self.previous = Some((idle, total));
            percent
        }

        #[cfg(not(target_os = "linux"))]
        pub fn sample_percent(&mut self) -> f64 {
            0.0
        }
    }
}
