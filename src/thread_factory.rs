//! Pluggable creation of worker threads.
//!
//! A [`crate::TaskQueue`] never calls [`std::thread::spawn`] itself. It hands the
//! worker loop to a [`WorkerThreadFactory`] and starts whatever [`WorkerThread`]
//! comes back, so naming, stack sizes or instrumentation can be changed without
//! touching the queue.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use parking_lot::RwLock;

use crate::{config::Config, error::Result};

/// The code a worker thread runs.
pub type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

/// A worker thread that has been configured but not started yet.
pub struct WorkerThread {
    builder: thread::Builder,
    body: WorkerBody,
}

impl WorkerThread {
    pub fn new(builder: thread::Builder, body: WorkerBody) -> WorkerThread {
        WorkerThread { builder, body }
    }

    /// Wrap the body. `f` receives the original body and decides when to run it.
    pub fn wrap<F>(self, f: F) -> WorkerThread
    where
        F: FnOnce(WorkerBody) + Send + 'static,
    {
        let body = self.body;
        WorkerThread {
            builder: self.builder,
            body: Box::new(move || f(body)),
        }
    }

    /// Spawn the thread.
    pub fn start(self) -> Result<JoinHandle<()>> {
        Ok(self.builder.spawn(self.body)?)
    }
}

/// Strategy producing startable worker threads.
///
/// A [`crate::TaskQueue`] calls [`Self::new_worker`] and [`WorkerThread::start`] while
/// holding its internal lock. Implementations must not call back into that queue
/// (submit, shut down or query it), or the submitting thread deadlocks. Code added
/// with [`WorkerThread::wrap`] runs on the new thread and is not restricted.
pub trait WorkerThreadFactory: Send + Sync {
    fn new_worker(&self, body: WorkerBody) -> WorkerThread;
}

impl<F> WorkerThreadFactory for F
where
    F: Fn(WorkerBody) -> WorkerThread + Send + Sync,
{
    fn new_worker(&self, body: WorkerBody) -> WorkerThread {
        self(body)
    }
}

/// Plain named threads: `"{prefix}-{n}"` with `n` counting up per factory.
pub struct DefaultThreadFactory {
    prefix: String,
    stack_size: Option<usize>,
    spawned: AtomicUsize,
}

impl DefaultThreadFactory {
    pub fn new(config: &Config) -> DefaultThreadFactory {
        DefaultThreadFactory {
            prefix: config.thread_name_prefix.clone(),
            stack_size: config.stack_size,
            spawned: AtomicUsize::new(0),
        }
    }
}

impl Default for DefaultThreadFactory {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl WorkerThreadFactory for DefaultThreadFactory {
    fn new_worker(&self, body: WorkerBody) -> WorkerThread {
        let n = self.spawned.fetch_add(1, Ordering::Relaxed);
        let mut builder = thread::Builder::new().name(format!("{}-{}", self.prefix, n));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        WorkerThread::new(builder, body)
    }
}

/// Delegating holder for the factory currently in use.
pub struct ThreadFactory {
    inner: RwLock<Arc<dyn WorkerThreadFactory>>,
}

impl ThreadFactory {
    pub fn new(factory: Arc<dyn WorkerThreadFactory>) -> ThreadFactory {
        ThreadFactory {
            inner: RwLock::new(factory),
        }
    }

    /// Replace the installed factory and return the previous one.
    pub fn install(&self, factory: Arc<dyn WorkerThreadFactory>) -> Arc<dyn WorkerThreadFactory> {
        std::mem::replace(&mut *self.inner.write(), factory)
    }

    pub fn current(&self) -> Arc<dyn WorkerThreadFactory> {
        self.inner.read().clone()
    }
}

impl Default for ThreadFactory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultThreadFactory::default()))
    }
}

impl WorkerThreadFactory for ThreadFactory {
    fn new_worker(&self, body: WorkerBody) -> WorkerThread {
        // Release the lock before calling out so a factory may reinstall itself.
        let factory = self.current();
        factory.new_worker(body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_default_factory_names_threads() {
        let config = Config::builder().thread_name_prefix("flush").build().unwrap();
        let factory = DefaultThreadFactory::new(&config);

        for expected in ["flush-0", "flush-1"] {
            let (tx, rx) = mpsc::channel();
            let worker = factory.new_worker(Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            }));
            worker.start().unwrap().join().unwrap();
            assert_eq!(rx.recv().unwrap().as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_wrap() {
        let (tx, rx) = mpsc::channel();
        let tx_inner = tx.clone();
        let worker = DefaultThreadFactory::default()
            .new_worker(Box::new(move || tx_inner.send("body").unwrap()))
            .wrap(move |body| {
                tx.send("before").unwrap();
                body();
                tx.send("after").unwrap();
            });
        worker.start().unwrap().join().unwrap();

        assert_eq!(rx.iter().collect::<Vec<_>>(), vec!["before", "body", "after"]);
    }

    #[test]
    fn test_install_returns_previous() {
        let holder = ThreadFactory::default();
        let counter = Arc::new(AtomicUsize::new(0));

        let counting = {
            let counter = counter.clone();
            move |body: WorkerBody| {
                counter.fetch_add(1, Ordering::SeqCst);
                WorkerThread::new(thread::Builder::new().name("counted".into()), body)
            }
        };
        let previous = holder.install(Arc::new(counting));

        holder.new_worker(Box::new(|| ())).start().unwrap().join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let counting = holder.install(previous);
        holder.new_worker(Box::new(|| ())).start().unwrap().join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        counting.new_worker(Box::new(|| ())).start().unwrap().join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
