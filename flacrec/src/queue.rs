//! Task Queue
//!
//! FIFO hand-off between the real-time monitor and the conversion workers.
//!
//! **Architecture:**
//! - `Mutex<VecDeque>` + `Condvar` (workers block in [`TaskQueue::pop`])
//! - Unfinished counter: incremented on `push`, decremented on `task_done`
//! - [`TaskQueue::drain`] waits until the counter reaches zero
//! - [`TaskQueue::close`] wakes every blocked worker; `pop` then returns
//!   `None` once the backlog is empty
//!
//! Each job is handed to exactly one `pop` caller.

use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::warn;

struct QueueState<T> {
    items: VecDeque<T>,

    /// Pushed but not yet marked done
    unfinished: usize,

    closed: bool,
}

/// Thread-safe FIFO with a completion barrier
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Signalled when an item is pushed or the queue closes
    available: Condvar,

    /// Signalled when `unfinished` drops to zero
    all_done: Condvar,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                unfinished: 0,
                closed: false,
            }),
            available: Condvar::new(),
            all_done: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // Every mutation is a single step, so a poisoned lock still guards consistent state
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a job and wake one waiting worker
    ///
    /// Never blocks beyond the lock. Fails once the queue is closed.
    pub fn push(&self, item: T) -> Result<()> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::Queue("queue is closed".to_string()));
            }
            state.items.push_back(item);
            state.unfinished += 1;
        }
        self.available.notify_one();
        Ok(())
    }

    /// Take the oldest job, blocking until one is available
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Mark one previously popped job as finished
    pub fn task_done(&self) {
        let mut state = self.lock();
        if state.unfinished == 0 {
            warn!("task_done called more times than jobs were queued");
            return;
        }
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every pushed job has been popped and marked done
    pub fn drain(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .all_done
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Like [`drain`](Self::drain) but gives up after `timeout`
    ///
    /// Returns `true` if the queue drained.
    pub fn drain_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.unfinished > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .all_done
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state = guard;
        }
        true
    }

    /// Stop accepting jobs and release blocked workers
    ///
    /// Jobs already queued are still handed out by `pop`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Jobs waiting to be popped
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs pushed but not yet marked done (waiting or in progress)
    pub fn unfinished(&self) -> usize {
        self.lock().unfinished
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
