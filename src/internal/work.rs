use super::State;

pub(crate) type Job = Box<dyn FnOnce(&State) + Send + 'static>;

/// An entry of the pending sequence.
pub(crate) enum Work {
    Task(Job),
    /// Tells the worker to terminate the queue once it is reached.
    Shutdown,
}
