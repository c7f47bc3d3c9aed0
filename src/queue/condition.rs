//! A settable flag with a bounded wait, used for the matcher's
//! cross-queue rendezvous.

use crate::queue::QueueError;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A boolean flag paired with a condition variable.
///
/// The internal matcher parks its submission thread on these while the
/// downstream driver acknowledges a passive order (`is_live`) or answers a
/// cancel (`is_terminal`). Waits are bounded: a timeout surfaces as an
/// error to the waiter instead of deadlocking the queue.
pub struct FlagCondition {
    flag: Mutex<bool>,
    signal: Condvar,
}

impl FlagCondition {
    /// A cleared flag.
    pub fn new() -> Self {
        FlagCondition {
            flag: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    /// Sets the flag and wakes every waiter. Setting an already-set flag
    /// is a no-op.
    pub fn set(&self) {
        let mut flag = self.flag.lock();
        if *flag {
            return;
        }
        *flag = true;
        self.signal.notify_all();
    }

    /// Clears the flag for reuse.
    pub fn reset(&self) {
        *self.flag.lock() = false;
    }

    /// Whether the flag is currently set.
    pub fn is_set(&self) -> bool {
        *self.flag.lock()
    }

    /// Blocks until the flag is set or `timeout` elapses.
    ///
    /// # Errors
    /// Returns [`QueueError::TimedOut`] when the timeout elapses first.
    pub fn wait_for(&self, timeout: Duration) -> Result<(), QueueError> {
        let deadline = Instant::now() + timeout;
        let mut flag = self.flag.lock();
        while !*flag {
            if self.signal.wait_until(&mut flag, deadline).timed_out() {
                if *flag {
                    break;
                }
                return Err(QueueError::TimedOut);
            }
        }
        Ok(())
    }
}

impl Default for FlagCondition {
    fn default() -> Self {
        FlagCondition::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_wait_times_out() {
        let condition = FlagCondition::new();
        assert_eq!(
            condition.wait_for(Duration::from_millis(10)),
            Err(QueueError::TimedOut)
        );
    }

    #[test]
    fn test_set_before_wait_returns_immediately() {
        let condition = FlagCondition::new();
        condition.set();
        assert_eq!(condition.wait_for(Duration::from_millis(10)), Ok(()));
    }

    #[test]
    fn test_set_wakes_waiter() {
        let condition = Arc::new(FlagCondition::new());
        let waiter = {
            let condition = Arc::clone(&condition);
            std::thread::spawn(move || condition.wait_for(Duration::from_secs(5)))
        };
        std::thread::sleep(Duration::from_millis(20));
        condition.set();
        assert_eq!(waiter.join().expect("waiter thread"), Ok(()));
    }

    #[test]
    fn test_reset_clears_for_reuse() {
        let condition = FlagCondition::new();
        condition.set();
        condition.reset();
        assert!(!condition.is_set());
        assert_eq!(
            condition.wait_for(Duration::from_millis(10)),
            Err(QueueError::TimedOut)
        );
    }
}
