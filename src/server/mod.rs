//! Accepting connections and running them on a fixed set of workers.

pub mod listener;
pub mod pool;

pub use listener::Listener;
pub use pool::WorkerPool;
