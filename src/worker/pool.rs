//! Fixed-size worker pool.
//!
//! # Responsibilities
//! - Own N long-lived worker threads, each with its own executor
//! - Queue submitted tasks in FIFO order until a worker is idle
//! - Deliver each task's outcome back to its submitter
//!
//! # Design Decisions
//! - One shared queue; idle workers wait on it behind a fair async mutex,
//!   so tasks are taken in submission order
//! - One task per worker at a time
//! - No timeouts or cancellation: a controller that never settles keeps
//!   its worker busy forever
//! - A worker whose thread dies is not replaced; its in-flight submission
//!   fails with `WorkerLost` and the remaining workers keep draining the queue

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::observability::metrics;
use crate::routing::ModuleCatalog;
use crate::worker::executor::WorkerExecutor;
use crate::worker::{DispatchError, WorkerTask};

type Reply = oneshot::Sender<Result<Value, DispatchError>>;

struct Job {
    task: WorkerTask,
    reply: Reply,
}

type SharedQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Default pool size for a machine with `cores` logical CPUs.
pub fn default_pool_size(cores: usize) -> usize {
    ((cores as f64 / 1.5).floor() as usize).max(1)
}

/// Pool of worker threads executing controllers off the listener.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
    queued: Arc<AtomicUsize>,
    submitted: AtomicU64,
}

impl WorkerPool {
    /// Spawn `size` workers. Each loads route modules through `catalog`
    /// independently.
    pub fn start(size: usize, catalog: Arc<ModuleCatalog>) -> std::io::Result<Self> {
        let size = size.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let queued = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let executor = WorkerExecutor::new(worker_id, catalog.clone());
            let queue = queue.clone();
            let queued = queued.clone();
            let handle = thread::Builder::new()
                .name(format!("route-worker-{}", worker_id))
                .spawn(move || run_worker(executor, queue, queued))?;
            workers.push(handle);
        }

        tracing::info!(workers = size, "Worker pool started");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            size,
            queued,
            submitted: AtomicU64::new(0),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks waiting for an idle worker.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Total tasks accepted since the pool started.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Queue a task and return a future resolving to the controller's outcome.
    ///
    /// The task is enqueued before this returns, so submission order is the
    /// order of `submit` calls, not the order the futures are first polled.
    pub fn submit(
        &self,
        task: WorkerTask,
    ) -> impl Future<Output = Result<Value, DispatchError>> + Send + 'static {
        let enqueued = self.enqueue(task);
        async move {
            match enqueued {
                Ok(outcome) => outcome.await.unwrap_or(Err(DispatchError::WorkerLost)),
                Err(e) => Err(e),
            }
        }
    }

    fn enqueue(
        &self,
        task: WorkerTask,
    ) -> Result<oneshot::Receiver<Result<Value, DispatchError>>, DispatchError> {
        let (reply, outcome) = oneshot::channel();
        let sender = self
            .sender
            .lock()
            .map_err(|_| DispatchError::Closed)?
            .clone()
            .ok_or(DispatchError::Closed)?;

        self.queued.fetch_add(1, Ordering::Relaxed);
        if sender.send(Job { task, reply }).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return Err(DispatchError::Closed);
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        metrics::record_queue_depth(self.queued());
        Ok(outcome)
    }

    /// Close the queue and wait for the workers to finish queued tasks.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(_) => None,
        };
        drop(sender);

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };
        if workers.is_empty() {
            return;
        }

        let joined = tokio::task::spawn_blocking(move || {
            for handle in workers {
                if handle.join().is_err() {
                    tracing::error!("Worker thread exited with a panic");
                }
            }
        })
        .await;
        if let Err(e) = joined {
            tracing::error!(error = %e, "Failed to join worker threads");
        }

        tracing::info!("Worker pool stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets detached workers exit once it drains.
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }
}

/// Mark one queued task as taken by a worker and publish the new depth.
fn take_queued(queued: &AtomicUsize) -> usize {
    let depth = queued.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::record_queue_depth(depth);
    depth
}

fn run_worker(mut executor: WorkerExecutor, queue: SharedQueue, queued: Arc<AtomicUsize>) {
    let worker_id = executor.worker_id();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(worker = worker_id, error = %e, "Failed to build worker runtime");
            return;
        }
    };

    tracing::debug!(worker = worker_id, "Worker started");

    runtime.block_on(async {
        loop {
            let job = {
                let mut rx = queue.lock().await;
                rx.recv().await
            };
            let Some(job) = job else { break };
            take_queued(&queued);

            let outcome = executor.execute(job.task).await;
            metrics::record_dispatch(outcome.is_ok());
            if job.reply.send(outcome).is_err() {
                tracing::debug!(worker = worker_id, "Submitter went away before the result");
            }
        }
    });

    tracing::debug!(worker = worker_id, "Worker shutting down");
}
