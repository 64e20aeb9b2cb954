//! Bounded blocking FIFO shared by the pool's workers.

use crate::err::{Result, StressError};
use log::trace;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct Inner<T> {
    items: VecDeque<T>,
    enabled: bool,
}

/// BoundedQueue
///
/// Producers block in [`push`](BoundedQueue::push) while the queue holds
/// `max_size` items, consumers block in [`pop`](BoundedQueue::pop) while it
/// is empty. [`disable`](BoundedQueue::disable) is a one-way switch that
/// releases every waiter.
///
/// A disabled queue still accepts pushes: the item is appended and will be
/// handed out by `pop` like any other.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    len: AtomicUsize,
    // mirrors `Inner::enabled` for lock-free readers
    live: AtomicBool,
    max_size: usize,
}

impl<T> BoundedQueue<T> {
    /// New an enabled, empty queue holding at most `max_size` items.
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(StressError::InvalidConfig(
                "queue capacity must be positive".to_owned(),
            ));
        }
        Ok(BoundedQueue {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(max_size),
                enabled: true,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            len: AtomicUsize::new(0),
            live: AtomicBool::new(true),
            max_size,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // items are never touched while a task runs, poisoning leaves them intact
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `item`, waiting for room while the queue is full and enabled.
    pub fn push(&self, item: T) {
        let mut inner = self
            .not_full
            .wait_while(self.lock(), |inner| {
                inner.enabled && inner.items.len() >= self.max_size
            })
            .unwrap_or_else(PoisonError::into_inner);
        inner.items.push_back(item);
        self.len.store(inner.items.len(), Ordering::Release);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Take the head item, waiting while the queue is empty and enabled.
    ///
    /// Returns `None` only once the queue is disabled and fully drained.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self
            .not_empty
            .wait_while(self.lock(), |inner| {
                inner.enabled && inner.items.is_empty()
            })
            .unwrap_or_else(PoisonError::into_inner);
        let item = inner.items.pop_front();
        self.len.store(inner.items.len(), Ordering::Release);
        drop(inner);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Disable the queue and wake all producers and consumers.
    ///
    /// Returns `true` for the call that actually flipped the flag.
    pub fn disable(&self) -> bool {
        let mut inner = self.lock();
        if !inner.enabled {
            return false;
        }
        inner.enabled = false;
        self.live.store(false, Ordering::Release);
        drop(inner);
        trace!("queue disabled");
        self.not_full.notify_all();
        self.not_empty.notify_all();
        true
    }

    /// Drop every queued item and return how many there were.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let dropped = inner.items.len();
        inner.items.clear();
        self.len.store(0, Ordering::Release);
        drop(inner);
        self.not_full.notify_all();
        dropped
    }

    /// Whether the queue is still enabled.
    pub fn is_enabled(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Approximate number of queued items, for diagnostics only.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether the queue looked empty at the time of the call.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity bound enforced on enabled pushes.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
