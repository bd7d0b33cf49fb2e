use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

/// Return from the enclosing task if the queue has been shut down immediately.
/// Can be used inside a task submitted with [`crate::TaskQueue::submit_with_state`].
///
/// ## Example usage:
/// ```rust ignore
/// queue.submit_with_state(|state| {
///     while work_not_done {
///         check_if_cancelled!(state);
///         do_work();
///     }
/// });
/// ```
///
/// ## Shorthand for:
/// ```rust ignore
/// if state.is_cancelled() {
///    return;
/// }
/// ```
#[macro_export]
macro_rules! check_if_cancelled {
    ($state:expr) => {
        if $state.is_cancelled() {
            return;
        }
    };
}

/// Cancellation handle shared between a [`crate::TaskQueue`] and the tasks it runs.
///
/// The flag is raised once by [`crate::TaskQueue::shutdown_immediately`] and never cleared.
pub struct State {
    is_canceled: Arc<AtomicBool>,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            is_canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn cancel(&self) {
        self.is_canceled.store(true, Ordering::Release);
    }

    /// Returns true once the queue has been shut down immediately.
    pub fn is_cancelled(&self) -> bool {
        self.is_canceled.load(Ordering::Acquire)
    }

    /// Block the current thread for `duration`, waking early on cancellation.
    ///
    /// Returns `true` if the full duration elapsed and `false` if the sleep was
    /// cut short because the queue was shut down immediately.
    ///
    /// Only a sleep on the queue's worker thread is woken early, since shutdown
    /// unparks that thread alone. A sleep on another thread holding a clone of
    /// this `State` notices the cancellation at its deadline.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

impl Clone for State {
    fn clone(&self) -> State {
        State {
            is_canceled: self.is_canceled.clone(),
        }
    }
}
