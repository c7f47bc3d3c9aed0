//! Scheduling primitives: serialized task queues, state-latched queues and
//! the bounded rendezvous flag.

mod condition;
mod state_queue;
mod task_queue;
mod writer;

pub use condition::FlagCondition;
pub use state_queue::StateQueue;
pub use task_queue::TaskQueue;
pub use writer::{CallbackWriter, QueueWriter};

use thiserror::Error;

/// Errors surfaced by queue reads and bounded waits.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum QueueError {
    /// The feed behind the queue closed before producing a value.
    #[error("queue is broken")]
    Broken,

    /// A bounded wait elapsed before the awaited state was reached.
    #[error("timed out waiting for queue state")]
    TimedOut,
}
