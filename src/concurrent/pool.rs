//! Fixed worker pool with enqueue-with-handle and fire-and-forget surfaces.
//!
//! ## Architecture
//!
//! ```text
//!   submit(task) ──► ┌─────────────────────────────┐
//!   spawn(task)  ──► │  Mutex<PoolState>           │
//!                    │    queue: VecDeque<Job>     │◄── Condvar (work_ready)
//!                    │    target_workers, active   │──► Condvar (idle)
//!                    └──────────┬──────────────────┘
//!                               │ pop_front
//!                 ┌─────────────┼─────────────┐
//!                 ▼             ▼             ▼
//!             worker 0      worker 1      worker n-1
//! ```
//!
//! - `submit` returns a [`TaskHandle`]; dropping the handle does **not**
//!   cancel the task (detached semantics), it only discards the result.
//! - Worker panics are caught, logged, and the worker keeps running.
//! - `resize` serializes with the enqueue path. Shrinking joins the excess
//!   workers after they finish their current job; queued tasks are preserved
//!   for the remaining workers.
//! - Dropping the pool drains the queue before the workers exit.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::error;

use crate::error::CacheError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a task submitted with [`WorkerPool::submit`].
///
/// The task runs to completion whether or not the handle is kept.
pub struct TaskHandle<T> {
    rx: mpsc::Receiver<Result<T, CacheError>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes and returns its result. A task that
    /// died without reporting (panic before the wrapper, pool torn down)
    /// surfaces as [`CacheError::AsyncFailure`].
    pub fn wait(self) -> Result<T, CacheError> {
        self.rx.recv().unwrap_or_else(|_| {
            Err(CacheError::AsyncFailure(
                "task finished without producing a result".to_string(),
            ))
        })
    }

    /// Non-blocking probe; `None` while the task is still running.
    pub fn try_wait(&self) -> Option<Result<T, CacheError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(CacheError::AsyncFailure(
                "task finished without producing a result".to_string(),
            ))),
        }
    }

    /// Blocks up to `timeout`; `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, CacheError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Err(CacheError::AsyncFailure(
                "task finished without producing a result".to_string(),
            ))),
        }
    }
}

struct PoolState {
    queue: VecDeque<Job>,
    target_workers: usize,
    active: usize,
    shutdown: bool,
}

struct PoolInner {
    state: Mutex<PoolState>,
    work_ready: Condvar,
    idle: Condvar,
}

struct Worker {
    id: usize,
    handle: JoinHandle<()>,
}

/// Fixed-size thread pool shared by the concurrent cache manager.
pub struct WorkerPool {
    inner: Arc<PoolInner>,
    workers: Mutex<Vec<Worker>>,
}

/// Default pool size: hardware parallelism, at least 2.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(2)
}

impl WorkerPool {
    /// Creates a pool with `workers` threads (clamped to ≥ 1).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let inner = Arc::new(PoolInner {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                target_workers: workers,
                active: 0,
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            idle: Condvar::new(),
        });

        let pool = Self {
            inner,
            workers: Mutex::new(Vec::with_capacity(workers)),
        };
        {
            let mut guard = pool.workers.lock();
            for id in 0..workers {
                guard.push(Self::spawn_worker(&pool.inner, id));
            }
        }
        pool
    }

    /// Creates a pool sized for the host: hardware parallelism, minimum 2.
    pub fn with_default_size() -> Self {
        Self::new(default_worker_count())
    }

    fn spawn_worker(inner: &Arc<PoolInner>, id: usize) -> Worker {
        let inner = Arc::clone(inner);
        let handle = std::thread::Builder::new()
            .name(format!("vfscache-worker-{id}"))
            .spawn(move || Self::worker_loop(id, inner))
            .expect("failed to spawn worker thread");
        Worker { id, handle }
    }

    fn worker_loop(id: usize, inner: Arc<PoolInner>) {
        loop {
            let job = {
                let mut state = inner.state.lock();
                loop {
                    if state.shutdown && state.queue.is_empty() {
                        return;
                    }
                    if !state.shutdown && id >= state.target_workers {
                        return;
                    }
                    if let Some(job) = state.queue.pop_front() {
                        state.active += 1;
                        break job;
                    }
                    inner.work_ready.wait(&mut state);
                }
            };

            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                error!(worker = id, "pool task panicked; worker continues");
            }

            let mut state = inner.state.lock();
            state.active -= 1;
            if state.queue.is_empty() && state.active == 0 {
                inner.idle.notify_all();
            }
        }
    }

    /// Enqueues a task and returns a handle to its result.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.spawn(move || {
            // the receiver may be gone; detached tasks still run
            let _ = tx.send(task());
        });
        TaskHandle { rx }
    }

    /// Enqueues a fire-and-forget task.
    pub fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        {
            let mut state = self.inner.state.lock();
            state.queue.push_back(Box::new(task));
        }
        self.inner.work_ready.notify_one();
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Number of queued tasks not yet picked up.
    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Number of workers currently running a task.
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active
    }

    pub fn is_busy(&self) -> bool {
        let state = self.inner.state.lock();
        !state.queue.is_empty() || state.active > 0
    }

    /// Blocks until the queue is empty and every worker is idle.
    pub fn wait_idle(&self) {
        let mut state = self.inner.state.lock();
        while !(state.queue.is_empty() && state.active == 0) {
            self.inner.idle.wait(&mut state);
        }
    }

    /// Grows or shrinks the pool to `new_size` workers (clamped to ≥ 1).
    ///
    /// Shrinking joins the excess workers after their current task; queued
    /// tasks stay queued for the survivors.
    pub fn resize(&self, new_size: usize) {
        let new_size = new_size.max(1);
        let mut workers = self.workers.lock();
        let current = workers.len();
        if new_size == current {
            return;
        }

        {
            let mut state = self.inner.state.lock();
            state.target_workers = new_size;
        }

        if new_size < current {
            self.inner.work_ready.notify_all();
            for worker in workers.drain(new_size..) {
                debug_assert!(worker.id >= new_size);
                let _ = worker.handle.join();
            }
        } else {
            for id in current..new_size {
                workers.push(Self::spawn_worker(&self.inner, id));
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        {
            let mut state = self.inner.state.lock();
            state.shutdown = true;
        }
        self.inner.work_ready.notify_all();
        let mut workers = self.workers.lock();
        for worker in workers.drain(..) {
            let _ = worker.handle.join();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.worker_count())
            .field("queued", &self.queue_len())
            .field("active", &self.active_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn submit_returns_the_task_result() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit(|| Ok(21 * 2));
        assert_eq!(handle.wait(), Ok(42));
    }

    #[test]
    fn submit_propagates_task_errors() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit::<(), _>(|| Err(CacheError::NotFound));
        assert_eq!(handle.wait(), Err(CacheError::NotFound));
    }

    #[test]
    fn panicking_task_surfaces_as_async_failure() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit::<(), _>(|| panic!("boom"));
        assert!(matches!(handle.wait(), Err(CacheError::AsyncFailure(_))));

        // the worker survived the panic
        let handle = pool.submit(|| Ok(1));
        assert_eq!(handle.wait(), Ok(1));
    }

    #[test]
    fn dropped_handle_does_not_cancel_the_task() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        drop(pool.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn spawn_runs_detached_tasks() {
        let pool = WorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let c = Arc::clone(&counter);
            pool.spawn(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 16);
        assert!(!pool.is_busy());
    }

    #[test]
    fn zero_size_is_clamped() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.worker_count(), 1);
        assert_eq!(pool.submit(|| Ok(7)).wait(), Ok(7));
    }

    #[test]
    fn default_size_is_at_least_two() {
        assert!(default_worker_count() >= 2);
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let pool = WorkerPool::new(2);
        pool.resize(4);
        assert_eq!(pool.worker_count(), 4);

        pool.resize(1);
        assert_eq!(pool.worker_count(), 1);

        // the survivor still serves tasks
        assert_eq!(pool.submit(|| Ok("alive")).wait(), Ok("alive"));
    }

    #[test]
    fn shrink_preserves_queued_tasks() {
        let pool = WorkerPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..64 {
            let c = Arc::clone(&counter);
            pool.spawn(move || {
                std::thread::sleep(Duration::from_millis(1));
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.resize(1);
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn drop_drains_outstanding_tasks() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2);
            for _ in 0..32 {
                let c = Arc::clone(&counter);
                pool.spawn(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }

    #[test]
    fn wait_timeout_times_out_on_slow_tasks() {
        let pool = WorkerPool::new(1);
        let handle = pool.submit(|| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(())
        });
        assert!(handle.wait_timeout(Duration::from_millis(1)).is_none());
        assert_eq!(handle.wait_timeout(Duration::from_secs(5)), Some(Ok(())));
    }
}
