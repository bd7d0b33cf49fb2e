use std::{
    any::Any,
    collections::VecDeque,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, Thread},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace};

use crate::{
    config::{Config, PanicPolicy},
    error::Result,
    internal::{Job, PendingQueue, State, Work},
    thread_factory::{DefaultThreadFactory, ThreadFactory, WorkerThreadFactory},
};

/// Lifecycle of a [`TaskQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No worker thread and not terminated.
    Idle,
    /// A worker thread is draining the queue.
    Active,
    /// Terminal. No further task will start.
    Terminated,
}

struct Inner {
    pending: PendingQueue,
    /// The live worker, if any. Only the worker itself clears this slot.
    worker: Option<Thread>,
    terminated: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    /// Signalled whenever the worker slot is cleared.
    idle: Condvar,
    /// Lock-free mirror of `Inner::terminated`.
    terminated: AtomicBool,
    state: State,
    panic_policy: PanicPolicy,
}

/// A background queue that runs tasks one after another on a single worker thread.
///
/// The worker is started lazily by [`Self::submit`] and ends by itself as soon as
/// the queue is empty, so an idle queue holds no thread. Tasks run strictly in
/// submission order.
///
/// The queue is shut down by one of three methods:
/// - [`Self::shutdown_after_queued`] runs everything queued so far, then terminates.
/// - [`Self::shutdown_after_current`] terminates now and discards pending tasks.
///   A task that is already running is allowed to finish.
/// - [`Self::shutdown_immediately`] does the same and also cancels the running task,
///   waking it if it is blocked in [`State::sleep`].
///
/// The terminated check and the enqueue in [`Self::submit`] happen under the same
/// lock as the shutdown methods. A submission that starts after
/// `shutdown_after_current` or `shutdown_immediately` returned is always ignored.
pub struct TaskQueue {
    shared: Arc<Shared>,
    factory: ThreadFactory,
}

impl TaskQueue {
    /// Create an idle queue with the default configuration.
    pub fn new() -> TaskQueue {
        let config = Config::default();
        let factory = Arc::new(DefaultThreadFactory::new(&config));
        Self::build(&config, factory)
    }

    /// Create an idle queue whose worker threads follow `config`.
    pub fn with_config(config: Config) -> Result<TaskQueue> {
        config.validate()?;
        let factory = Arc::new(DefaultThreadFactory::new(&config));
        Ok(Self::build(&config, factory))
    }

    /// Create an idle queue that starts its workers through `factory`.
    ///
    /// `factory` is called with the queue lock held and must not call back into this queue.
    pub fn with_factory(
        config: Config,
        factory: Arc<dyn WorkerThreadFactory>,
    ) -> Result<TaskQueue> {
        config.validate()?;
        Ok(Self::build(&config, factory))
    }

    fn build(config: &Config, factory: Arc<dyn WorkerThreadFactory>) -> TaskQueue {
        TaskQueue {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    pending: PendingQueue::new(),
                    worker: None,
                    terminated: false,
                }),
                idle: Condvar::new(),
                terminated: AtomicBool::new(false),
                state: State::new(),
                panic_policy: config.panic_policy,
            }),
            factory: ThreadFactory::new(factory),
        }
    }

    /// Replace the factory used for future workers and return the previous one.
    ///
    /// The factory's [`WorkerThreadFactory::new_worker`] and the returned
    /// [`crate::WorkerThread::start`] run while the queue lock is held. They must not call
    /// back into this queue, or the calling thread deadlocks.
    pub fn install_factory(
        &self,
        factory: Arc<dyn WorkerThreadFactory>,
    ) -> Arc<dyn WorkerThreadFactory> {
        self.factory.install(factory)
    }

    /// Add a task to the end of the queue and make sure a worker is running.
    /// Does nothing if the queue is terminated.
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move |_: &State| task()));
    }

    /// Like [`Self::submit`], but the task receives the queue's [`State`] and can
    /// observe [`Self::shutdown_immediately`] through it.
    pub fn submit_with_state<F>(&self, task: F)
    where
        F: FnOnce(&State) + Send + 'static,
    {
        self.enqueue(Box::new(task));
    }

    fn enqueue(&self, job: Job) {
        let mut inner = self.shared.inner.lock();
        if inner.terminated {
            trace!("task submitted to terminated queue ignored");
            drop(inner);
            drop(job);
            return;
        }
        inner.pending.push(Work::Task(job));
        self.ensure_worker(&mut inner);
    }

    /// Terminate once every task queued before this call has run.
    ///
    /// The queue stays open until the worker reaches the shutdown marker; tasks
    /// submitted in the meantime are queued behind the marker and discarded.
    pub fn shutdown_after_queued(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.terminated {
            return;
        }
        if inner.worker.is_none() && inner.pending.len() == 0 {
            debug!("shutdown after queued on idle queue");
            let discarded = self.shared.terminate(&mut inner);
            drop(inner);
            drop(discarded);
            return;
        }
        debug!(pending = inner.pending.len(), "shutdown after queued requested");
        inner.pending.push(Work::Shutdown);
        self.ensure_worker(&mut inner);
    }

    /// Terminate now and discard every pending task. A running task finishes normally.
    pub fn shutdown_after_current(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.terminated {
            return;
        }
        debug!("shutdown after current requested");
        let discarded = self.shared.terminate(&mut inner);
        drop(inner);
        drop(discarded);
    }

    /// Terminate now, discard every pending task and cancel the running one.
    ///
    /// The running task sees [`State::is_cancelled`] turn true, and a
    /// [`State::sleep`] in progress on the worker thread returns early. Only the
    /// worker thread is woken: a sleep on another thread holding a clone of the
    /// [`State`] runs to its deadline. Task code that never looks at its state
    /// runs to completion.
    pub fn shutdown_immediately(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.terminated {
            return;
        }
        debug!("shutdown immediately requested");
        let discarded = self.shared.terminate(&mut inner);
        self.shared.state.cancel();
        if let Some(worker) = &inner.worker {
            worker.unpark();
        }
        drop(inner);
        drop(discarded);
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.load(Ordering::Acquire)
    }

    pub fn state(&self) -> QueueState {
        let inner = self.shared.inner.lock();
        if inner.terminated {
            QueueState::Terminated
        } else if inner.worker.is_some() {
            QueueState::Active
        } else {
            QueueState::Idle
        }
    }

    /// Returns true while a worker thread exists. This can still be the case
    /// shortly after termination, while the last task finishes.
    pub fn has_live_worker(&self) -> bool {
        self.shared.inner.lock().worker.is_some()
    }

    /// Number of tasks waiting to start. Does not include a running task.
    pub fn pending_tasks(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    /// Block until no worker thread is live or `timeout` elapses.
    /// Returns true if the queue became idle.
    ///
    /// Calling this from inside a task always times out, since the caller is the worker.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.inner.lock();
        while inner.worker.is_some() {
            if self.shared.idle.wait_until(&mut inner, deadline).timed_out() {
                return inner.worker.is_none();
            }
        }
        true
    }

    /// Start a worker unless one is live. Runs under the queue lock, so the new
    /// worker cannot observe an empty slot before it has been filled in. The
    /// factory therefore must not re-enter the queue.
    fn ensure_worker(&self, inner: &mut Inner) {
        if inner.worker.is_some() {
            return;
        }
        let shared = self.shared.clone();
        let worker = self.factory.new_worker(Box::new(move || run_worker(shared)));
        match worker.start() {
            Ok(handle) => {
                debug!(thread = ?handle.thread().name(), "worker started");
                inner.worker = Some(handle.thread().clone());
            }
            Err(err) => {
                error!(
                    %err,
                    pending = inner.pending.len(),
                    "failed to start worker, tasks stay queued"
                );
            }
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskQueue {
    /// Let the worker drain what is already queued, then terminate.
    fn drop(&mut self) {
        self.shutdown_after_queued();
    }
}

impl Shared {
    /// Set the terminal flag and take the pending work out of the queue.
    /// The caller drops the returned work after releasing the lock.
    #[must_use]
    fn terminate(&self, inner: &mut Inner) -> VecDeque<Work> {
        inner.terminated = true;
        self.terminated.store(true, Ordering::Release);
        let dropped = inner.pending.len();
        if dropped > 0 {
            trace!(dropped, "pending tasks discarded");
        }
        inner.pending.take_all()
    }

    fn execute(&self, job: Job) {
        match self.panic_policy {
            PanicPolicy::Propagate => job(&self.state),
            PanicPolicy::LogAndContinue => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job(&self.state))) {
                    error!(panic = %panic_message(payload.as_ref()), "task panicked");
                }
            }
        }
    }

    fn release_worker(&self, inner: &mut Inner) {
        inner.worker = None;
        self.idle.notify_all();
    }
}

/// Clears the worker slot if a task panic unwinds the worker.
struct UnwindGuard<'a> {
    shared: &'a Shared,
}

impl Drop for UnwindGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("worker unwound by task panic");
            let mut inner = self.shared.inner.lock();
            self.shared.release_worker(&mut inner);
        }
    }
}

fn run_worker(shared: Arc<Shared>) {
    let _guard = UnwindGuard { shared: &shared };
    loop {
        let job = {
            let mut inner = shared.inner.lock();
            if inner.terminated {
                shared.release_worker(&mut inner);
                break;
            }
            match inner.pending.pop() {
                Some(Work::Task(job)) => job,
                Some(Work::Shutdown) => {
                    debug!("shutdown marker reached");
                    let discarded = shared.terminate(&mut inner);
                    shared.release_worker(&mut inner);
                    drop(inner);
                    drop(discarded);
                    break;
                }
                None => {
                    shared.release_worker(&mut inner);
                    break;
                }
            }
        };
        shared.execute(job);
    }
    debug!("worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
