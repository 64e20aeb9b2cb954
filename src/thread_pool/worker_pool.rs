use crate::err::{Result, StressError};
use crate::thread_pool::queue::BoundedQueue;
use log::{debug, error, info, trace, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Default capacity of the pool's task queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// ResultHandle
///
/// Eventual outcome of one submitted task. A task that returns yields
/// `Ok(value)`, a task that panics yields [`StressError::TaskPanicked`] and a
/// task that was dropped without ever running yields
/// [`StressError::TaskAbandoned`].
pub struct ResultHandle<T> {
    receiver: mpsc::Receiver<Result<T>>,
    ready: Option<Result<T>>,
}

impl<T> ResultHandle<T> {
    /// Block until the task finishes and take its outcome.
    pub fn wait(self) -> Result<T> {
        if let Some(outcome) = self.ready {
            return outcome;
        }
        match self.receiver.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(StressError::TaskAbandoned),
        }
    }

    /// Check without blocking whether the outcome is available.
    pub fn is_finished(&mut self) -> bool {
        if self.ready.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.ready = Some(outcome);
                true
            }
            Err(mpsc::TryRecvError::Empty) => false,
            Err(mpsc::TryRecvError::Disconnected) => {
                self.ready = Some(Err(StressError::TaskAbandoned));
                true
            }
        }
    }
}

/// PoolHandle
///
/// Cloneable access to a running [`WorkerPool`]. Tasks hold one of these to
/// submit more work or to stop the pool from inside a worker, which is safe
/// because stopping never joins.
#[derive(Clone)]
pub struct PoolHandle {
    queue: Arc<BoundedQueue<Job>>,
}

impl PoolHandle {
    /// Queue `job` and return a handle to its outcome.
    ///
    /// Blocks while the queue is full and the pool is enabled.
    pub fn submit<F, T>(&self, job: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(job))
                .map_err(|payload| StressError::TaskPanicked(panic_message(payload.as_ref())));
            if tx.send(outcome).is_err() {
                trace!("result handle dropped before task finished");
            }
        });
        ResultHandle {
            receiver: rx,
            ready: None,
        }
    }

    /// Queue `job` without keeping track of its outcome.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(Box::new(job));
    }

    /// Disable the queue. Queued and running tasks still complete.
    pub fn stop(&self) {
        if self.queue.disable() {
            info!("thread pool stopped");
        }
    }

    /// Whether the pool has not been stopped yet.
    pub fn is_enabled(&self) -> bool {
        self.queue.is_enabled()
    }

    /// Approximate number of queued tasks.
    pub fn size(&self) -> usize {
        self.queue.len()
    }
}

/// WorkerPool
///
/// A fixed number of workers pulling tasks from one [`BoundedQueue`].
///
/// # Note:
/// Dropping the pool stops it and then joins every worker, so the drop
/// waits for all queued tasks to finish. A task pushed through a
/// [`PoolHandle`] after the workers are gone is discarded and its handle
/// yields [`StressError::TaskAbandoned`]. The pool must not be dropped from
/// one of its own workers.
///
/// # Example:
///
/// ```
/// use stester::thread_pool::WorkerPool;
///
/// let pool = WorkerPool::new(4, 16).unwrap();
/// let handle = pool.submit(|| 6 * 7);
/// assert_eq!(42, handle.wait().unwrap());
/// pool.stop();
/// ```
pub struct WorkerPool {
    handle: PoolHandle,
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// New a pool with `threads` workers and a queue of `capacity` tasks.
    pub fn new(threads: usize, capacity: usize) -> Result<Self> {
        if threads == 0 {
            return Err(StressError::InvalidConfig(
                "threads must be positive".to_owned(),
            ));
        }

        let mut pool = WorkerPool {
            handle: PoolHandle {
                queue: Arc::new(BoundedQueue::new(capacity)?),
            },
            workers: Vec::with_capacity(threads),
        };
        // on a spawn failure `pool` is dropped, which stops and joins the rest
        for i in 0..threads {
            let worker = Worker::new(i, Arc::clone(&pool.handle.queue))?;
            pool.workers.push(worker);
        }
        debug!("thread pool started with {} workers", threads);
        Ok(pool)
    }

    /// See [`PoolHandle::submit`].
    pub fn submit<F, T>(&self, job: F) -> ResultHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handle.submit(job)
    }

    /// See [`PoolHandle::spawn`].
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.spawn(job)
    }

    /// Stop the pool; idempotent.
    pub fn stop(&self) {
        self.handle.stop()
    }

    /// Whether the pool has not been stopped yet.
    pub fn is_enabled(&self) -> bool {
        self.handle.is_enabled()
    }

    /// Approximate number of queued tasks.
    pub fn size(&self) -> usize {
        self.handle.size()
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// A cloneable handle for use inside tasks.
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.handle.is_enabled() {
            debug!("thread pool dropped while enabled");
            self.handle.stop();
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("worker-{} join failed", worker.id);
                }
            }
        }
        // pushed after the last worker exited; their handles resolve as abandoned
        let lost = self.handle.queue.clear();
        if lost > 0 {
            warn!("{} tasks queued after stop were never run", lost);
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, queue: Arc<BoundedQueue<Job>>) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                while let Some(job) = queue.pop() {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("worker-{} panic", id);
                    }
                }
                trace!("worker-{} shutting down", id);
            })?;
        Ok(Worker {
            id,
            thread: Some(thread),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
