//! thread pool

mod queue;
mod worker_pool;

pub use queue::BoundedQueue;
pub use worker_pool::{PoolHandle, ResultHandle, WorkerPool, DEFAULT_QUEUE_CAPACITY};
