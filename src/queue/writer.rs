//! The writer side of a queue, as seen by a data feed.

use crate::queue::StateQueue;
use std::sync::Arc;

/// Accepts values from a feed and an end-of-feed notification.
///
/// Market-data clients publish through this trait so the same subscription
/// call can feed either a latched [`StateQueue`] (for synchronous price
/// reads) or a task queue (for reactive handling), mirroring the two
/// subscriptions the simulator opens per security.
pub trait QueueWriter<T>: Send + Sync {
    /// Delivers one value.
    fn push(&self, value: T);

    /// Signals that no further values will arrive.
    fn close(&self);
}

impl<T: Clone + Send + Sync> QueueWriter<T> for StateQueue<T> {
    fn push(&self, value: T) {
        StateQueue::push(self, value);
    }

    fn close(&self) {
        StateQueue::close(self);
    }
}

impl<T, W: QueueWriter<T> + ?Sized> QueueWriter<T> for Arc<W> {
    fn push(&self, value: T) {
        (**self).push(value);
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Adapts a closure into a [`QueueWriter`], typically to enqueue each
/// delivery onto a [`crate::queue::TaskQueue`].
pub struct CallbackWriter<T> {
    on_push: Box<dyn Fn(T) + Send + Sync>,
    on_close: Box<dyn Fn() + Send + Sync>,
}

impl<T> CallbackWriter<T> {
    /// Builds a writer that forwards pushes to `on_push` and ignores
    /// close.
    pub fn new(on_push: impl Fn(T) + Send + Sync + 'static) -> Self {
        CallbackWriter {
            on_push: Box::new(on_push),
            on_close: Box::new(|| {}),
        }
    }

    /// Builds a writer with both push and close handlers.
    pub fn with_close(
        on_push: impl Fn(T) + Send + Sync + 'static,
        on_close: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        CallbackWriter {
            on_push: Box::new(on_push),
            on_close: Box::new(on_close),
        }
    }
}

impl<T: Send + Sync> QueueWriter<T> for CallbackWriter<T> {
    fn push(&self, value: T) {
        (self.on_push)(value);
    }

    fn close(&self) {
        (self.on_close)();
    }
}
