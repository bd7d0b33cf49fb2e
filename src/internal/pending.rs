use std::collections::VecDeque;

use super::Work;

/// FIFO of pending work. Not synchronised on its own: it lives inside the
/// queue's single mutex together with the worker slot and the terminated flag.
pub(crate) struct PendingQueue {
    work: VecDeque<Work>,
    num_tasks: usize,
}

impl PendingQueue {
    pub fn new() -> PendingQueue {
        PendingQueue {
            work: VecDeque::new(),
            num_tasks: 0,
        }
    }

    /// Number of user tasks waiting. Shutdown markers are not counted.
    pub fn len(&self) -> usize {
        self.num_tasks
    }

    pub fn push(&mut self, work: Work) {
        if let Work::Task(_) = work {
            self.num_tasks += 1;
        }
        self.work.push_back(work);
    }

    pub fn pop(&mut self) -> Option<Work> {
        let work = self.work.pop_front()?;
        if let Work::Task(_) = work {
            self.num_tasks -= 1;
        }
        Some(work)
    }

    /// Take everything pending, leaving the queue empty.
    ///
    /// The discarded work is handed back instead of dropped so the caller can
    /// drop it after releasing the queue lock. Captured values may call back
    /// into the queue from their `Drop`.
    pub fn take_all(&mut self) -> VecDeque<Work> {
        self.num_tasks = 0;
        std::mem::take(&mut self.work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Work {
        Work::Task(Box::new(|_| ()))
    }

    #[test]
    fn test_pending_queue() {
        let mut pending = PendingQueue::new();
        assert_eq!(pending.len(), 0);
        assert!(pending.pop().is_none());

        pending.push(task());
        pending.push(Work::Shutdown);
        pending.push(task());
        assert_eq!(pending.len(), 2);

        assert!(matches!(pending.pop(), Some(Work::Task(_))));
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending.pop(), Some(Work::Shutdown)));
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending.pop(), Some(Work::Task(_))));
        assert_eq!(pending.len(), 0);
        assert!(pending.pop().is_none());
    }

    #[test]
    fn test_take_all() {
        let mut pending = PendingQueue::new();
        pending.push(task());
        pending.push(task());
        pending.push(Work::Shutdown);

        let taken = pending.take_all();
        assert_eq!(taken.len(), 3);
        assert_eq!(pending.len(), 0);
        assert!(pending.pop().is_none());

        pending.push(Work::Shutdown);
        let taken = pending.take_all();
        assert!(matches!(taken.front(), Some(Work::Shutdown)));
        assert_eq!(pending.len(), 0);
    }

    #[test]
    fn test_take_all_does_not_drop_work() {
        struct DropFlag(std::sync::Arc<std::sync::atomic::AtomicBool>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let dropped = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let mut pending = PendingQueue::new();
        pending.push(Work::Task(Box::new(move |_| drop(flag))));

        let taken = pending.take_all();
        assert!(!dropped.load(std::sync::atomic::Ordering::SeqCst));
        drop(taken);
        assert!(dropped.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_fifo() {
        let mut pending = PendingQueue::new();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = seen.clone();
            pending.push(Work::Task(Box::new(move |_| seen.lock().push(i))));
        }

        let state = crate::internal::State::new();
        while let Some(Work::Task(job)) = pending.pop() {
            job(&state);
        }
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }
}
