//! # Serial Worker
//!
//! This crate provides a background [`TaskQueue`] that runs tasks one at a time on a single,
//! lazily started worker thread, and an [`OrderedIntSet`] that remembers insertion order.
//!
//! ## Task queue
//! The worker thread only exists while there is work. It is started by [`TaskQueue::submit`]
//! and ends by itself once the queue is empty. The next submission starts a new one.
//! Threads are created through a pluggable [`WorkerThreadFactory`].
//!
//! There are three ways to shut a queue down:
//! - [`TaskQueue::shutdown_after_queued`] runs everything already queued, then terminates.
//! - [`TaskQueue::shutdown_after_current`] lets the running task finish and drops the rest.
//! - [`TaskQueue::shutdown_immediately`] additionally cancels the running task.
//!
//! Once terminated, submissions are silently ignored.
//!
//! ## Example
//! ```rust
//! use serial_worker::prelude::*;
//! use std::sync::mpsc;
//! use std::time::Duration;
//!
//! let queue = TaskQueue::new();
//! let (tx, rx) = mpsc::channel();
//!
//! for i in 0..3 {
//!     let tx = tx.clone();
//!     queue.submit(move || tx.send(i).unwrap());
//! }
//!
//! assert!(queue.wait_until_idle(Duration::from_secs(5)));
//! assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
//!
//! queue.shutdown_after_queued();
//! assert!(queue.is_terminated());
//! ```
//!
//! ## Tasks can be cancelled
//! Tasks submitted with [`TaskQueue::submit_with_state`] receive a [`State`]. After
//! [`TaskQueue::shutdown_immediately`] it reports cancellation and [`State::sleep`] wakes up.
//! ```rust
//! use serial_worker::prelude::*;
//! use std::time::Duration;
//!
//! let queue = TaskQueue::new();
//!
//! queue.submit_with_state(|state| {
//!     loop {
//!         check_if_cancelled!(state);
//!         state.sleep(Duration::from_millis(50)); // Do some work
//!     }
//! });
//!
//! queue.shutdown_immediately();
//! assert!(queue.wait_until_idle(Duration::from_secs(5)));
//! ```
//!
//! ## Ordered set
//! ```rust
//! use serial_worker::OrderedIntSet;
//!
//! let mut set: OrderedIntSet = [3, 1, 4, 1, 5].into_iter().collect();
//! set.remove(4);
//!
//! assert_eq!(set.to_vec(), vec![3, 1, 5]);
//! assert_eq!(set.get(1).unwrap(), 1);
//! assert_eq!(set.ordered_match_count(&[5, 3, 9, 1]), 2);
//! ```

mod internal;
pub use internal::State;

pub mod config;
pub use config::{Config, ConfigBuilder, PanicPolicy};

pub mod error;
pub use error::{Error, Result};

pub mod ordered_set;
pub use ordered_set::{IntKeyStore, OrderedIntSet};

mod task_queue;
pub use task_queue::{QueueState, TaskQueue};

pub mod thread_factory;
pub use thread_factory::{
    DefaultThreadFactory,
    ThreadFactory,
    WorkerBody,
    WorkerThread,
    WorkerThreadFactory,
};

pub mod prelude {
    pub use crate::check_if_cancelled;
    pub use crate::internal::State;
    pub use crate::ordered_set::OrderedIntSet;
    pub use crate::task_queue::{QueueState, TaskQueue};
    pub use crate::thread_factory::WorkerThreadFactory;
}
