mod pending;
pub(crate) use pending::PendingQueue;

mod work;
pub(crate) use work::{Job, Work};

mod worker_state;
pub use worker_state::State;
