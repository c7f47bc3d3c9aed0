//! A single-slot queue that latches the most recent value.

use crate::queue::QueueError;
use parking_lot::{Condvar, Mutex};

struct Slot<T> {
    value: Option<T>,
    closed: bool,
}

/// A state-latched queue: writers overwrite a single slot, readers see the
/// latest value.
///
/// Market-data subscriptions feed one of these per security so price reads
/// always observe the current top of book without consuming a backlog.
/// Closing the queue marks it broken; a read against a broken, empty slot
/// fails with [`QueueError::Broken`] rather than blocking forever.
pub struct StateQueue<T> {
    slot: Mutex<Slot<T>>,
    available: Condvar,
}

impl<T: Clone> StateQueue<T> {
    /// An empty queue.
    pub fn new() -> Self {
        StateQueue {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Latches a new value, replacing any previous one. Pushes against a
    /// closed queue are dropped.
    pub fn push(&self, value: T) {
        let mut slot = self.slot.lock();
        if slot.closed {
            return;
        }
        slot.value = Some(value);
        self.available.notify_all();
    }

    /// Blocks until a value has been latched and returns a copy of it.
    ///
    /// # Errors
    /// Returns [`QueueError::Broken`] if the queue is closed while still
    /// empty.
    pub fn top(&self) -> Result<T, QueueError> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = &slot.value {
                return Ok(value.clone());
            }
            if slot.closed {
                return Err(QueueError::Broken);
            }
            self.available.wait(&mut slot);
        }
    }

    /// Returns the latched value without blocking, `None` when nothing has
    /// been observed yet.
    ///
    /// # Errors
    /// Returns [`QueueError::Broken`] if the queue is closed while still
    /// empty.
    pub fn try_top(&self) -> Result<Option<T>, QueueError> {
        let slot = self.slot.lock();
        if let Some(value) = &slot.value {
            return Ok(Some(value.clone()));
        }
        if slot.closed {
            return Err(QueueError::Broken);
        }
        Ok(None)
    }

    /// Marks the queue broken and wakes blocked readers.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.available.notify_all();
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }
}

impl<T: Clone> Default for StateQueue<T> {
    fn default() -> Self {
        StateQueue::new()
    }
}
