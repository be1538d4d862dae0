// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serial execution queues.

use std::any::Any;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::thread::ThreadId;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::DefaultTrap;
use crate::Error;
use crate::Trap;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A serial execution queue.
///
/// Tasks submitted to a queue run one at a time, in submission order, on a dedicated worker
/// thread. Every recorder owns one queue, and a [`LogReceptacle`](crate::LogReceptacle) owns one
/// more for filtering.
///
/// A panicking task is reported to the queue's [`Trap`] and does not stop the queue.
///
/// Cloning a queue is cheap; clones submit to the same worker. The worker stops once the last
/// clone is dropped, after draining the tasks already submitted.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("label", &self.inner.label)
            .finish_non_exhaustive()
    }
}

impl Queue {
    /// Create a new queue whose worker thread is named after `label`.
    pub fn new(label: impl Into<String>) -> Queue {
        Queue::with_trap(label, DefaultTrap::default())
    }

    /// Create a new queue reporting panicking tasks to `trap`.
    pub fn with_trap(label: impl Into<String>, trap: impl Trap) -> Queue {
        let label = label.into();
        let (sender, receiver) = crossbeam_channel::unbounded();

        let worker = Worker {
            label: label.clone(),
            receiver,
            trap: Box::new(trap),
        };
        let handle = thread::Builder::new()
            .name(label.clone())
            .spawn(move || worker.run())
            .expect("failed to spawn queue worker thread");
        let thread_id = handle.thread().id();

        Queue {
            inner: Arc::new(QueueInner {
                label,
                thread_id,
                state: Some(State { sender, handle }),
            }),
        }
    }

    /// The label of the queue.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Whether the calling thread is this queue's worker.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }

    /// Submit a task without waiting for it to run.
    pub fn exec_async(&self, task: impl FnOnce() + Send + 'static) {
        self.inner.send(Box::new(task));
    }

    /// Submit a task and block until it has run.
    ///
    /// When called from the queue's own worker thread, the task runs inline instead of being
    /// queued behind the caller.
    pub fn exec_sync(&self, task: impl FnOnce() + Send + 'static) {
        if self.is_current() {
            task();
            return;
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        self.inner.send(Box::new(move || {
            task();
            let _ = done_tx.send(());
        }));

        // a panicking task drops the sender without sending, which also releases us
        let _ = done_rx.recv();
    }

    /// Block until every task submitted before this call has run.
    pub fn barrier(&self) {
        self.exec_sync(|| {});
    }

    /// Whether two handles refer to the same queue.
    pub fn same_queue(&self, other: &Queue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

struct QueueInner {
    label: String,
    thread_id: ThreadId,
    state: Option<State>,
}

struct State {
    sender: Sender<Task>,
    handle: JoinHandle<()>,
}

impl QueueInner {
    fn send(&self, task: Task) {
        // SAFETY: state is always Some before dropped.
        let state = self.state.as_ref().unwrap();
        if state.sender.send(task).is_err() {
            let err = Error::new("failed to submit task to queue").with_context("queue", &self.label);
            DefaultTrap::default().trap(&err);
        }
    }
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        // SAFETY: state is always Some before dropped.
        let State { sender, handle } = self.state.take().unwrap();

        // drop our sender, the worker will break the loop after draining
        drop(sender);

        // the last handle may be released by a task running on the worker itself
        if thread::current().id() != self.thread_id {
            let _ = handle.join();
        }
    }
}

struct Worker {
    label: String,
    receiver: Receiver<Task>,
    trap: Box<dyn Trap>,
}

impl Worker {
    fn run(self) {
        let Self {
            label,
            receiver,
            trap,
        } = self;

        while let Ok(task) = receiver.recv() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                let err = Error::new("task panicked on queue")
                    .with_context("queue", &label)
                    .with_context("panic", panic_message(payload.as_ref()));
                trap.trap(&err);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingTrap(AtomicUsize);

    impl Trap for CountingTrap {
        fn trap(&self, _: &Error) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_tasks_run_in_submission_order() {
        let queue = Queue::new("test-order");
        let seen = Arc::new(Mutex::new(vec![]));

        for i in 0..100 {
            let seen = seen.clone();
            queue.exec_async(move || seen.lock().unwrap().push(i));
        }
        queue.barrier();

        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_exec_sync_waits_for_completion() {
        let queue = Queue::new("test-sync");
        let done = Arc::new(AtomicUsize::new(0));
        {
            let done = done.clone();
            queue.exec_sync(move || {
                thread::sleep(std::time::Duration::from_millis(20));
                done.store(1, Ordering::SeqCst);
            });
        }
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exec_sync_from_worker_runs_inline() {
        let queue = Queue::new("test-reentrant");
        let ran = Arc::new(AtomicUsize::new(0));

        let inner = queue.clone();
        let counter = ran.clone();
        queue.exec_sync(move || {
            assert!(inner.is_current());
            let counter = counter.clone();
            inner.exec_sync(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(!queue.is_current());
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let trap = Arc::new(CountingTrap::default());
        let queue = Queue::with_trap("test-panic", trap.clone());

        queue.exec_sync(|| panic!("boom"));
        let after = Arc::new(AtomicUsize::new(0));
        {
            let after = after.clone();
            queue.exec_sync(move || {
                after.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(trap.0.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_drains_pending_tasks() {
        let seen = Arc::new(AtomicUsize::new(0));
        {
            let queue = Queue::new("test-drain");
            for _ in 0..10 {
                let seen = seen.clone();
                queue.exec_async(move || {
                    seen.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
        assert_eq!(seen.load(Ordering::SeqCst), 10);
    }
}
