//! A serialized work queue backed by a dedicated worker thread.

use crossbeam::channel::{Receiver, Sender, unbounded};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;
use tracing::{error, info, trace};

type Task = Box<dyn FnOnce() + Send>;

/// Runs pushed closures one at a time, in push order, on a dedicated
/// thread.
///
/// Each subsystem instance owns one or more of these; every handler runs
/// to completion before the next starts, which is what makes the per-order
/// and per-security state single-writer. Panics inside a task are caught
/// and logged so one bad handler cannot take the queue down.
pub struct TaskQueue {
    sender: Option<Sender<Task>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskQueue {
    /// Starts a queue whose worker thread carries `name`.
    pub fn new(name: &str) -> Self {
        let (sender, receiver) = unbounded::<Task>();
        let thread_name = name.to_string();
        let worker = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || Self::run(&thread_name, receiver))
            .expect("failed to spawn task queue worker");
        TaskQueue {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    fn run(name: &str, receiver: Receiver<Task>) {
        trace!(queue = name, "task queue started");
        while let Ok(task) = receiver.recv() {
            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                error!(queue = name, "task panicked; continuing");
            }
        }
        trace!(queue = name, "task queue stopped");
    }

    /// Enqueues a closure. A push after [`TaskQueue::close`] is dropped.
    pub fn push(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(Box::new(task));
        }
    }

    /// Blocks until every task pushed so far has run.
    pub fn flush(&self) {
        let (sender, receiver) = std::sync::mpsc::channel();
        self.push(move || {
            let _ = sender.send(());
        });
        let _ = receiver.recv();
    }

    /// Stops accepting work, drains what was already queued and joins the
    /// worker.
    pub fn close(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("task queue worker terminated abnormally");
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        if self.sender.is_some() {
            info!("closing task queue on drop");
        }
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tasks_run_in_push_order() {
        let mut queue = TaskQueue::new("test");
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..100 {
            let log = Arc::clone(&log);
            queue.push(move || log.lock().push(i));
        }
        queue.close();
        assert_eq!(*log.lock(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_task_does_not_stop_the_queue() {
        let mut queue = TaskQueue::new("test");
        let count = Arc::new(AtomicUsize::new(0));
        queue.push(|| panic!("boom"));
        let counted = Arc::clone(&count);
        queue.push(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        queue.close();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_drains_pending_work() {
        let mut queue = TaskQueue::new("test");
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            let counted = Arc::clone(&count);
            queue.push(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            });
        }
        queue.close();
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }
}
