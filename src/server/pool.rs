//! Fixed-size worker pool
//!
//! A pool owns `size` tokio tasks that pull jobs from one shared queue. Each
//! worker finishes a job before taking the next, so at most `size` jobs run
//! at once. The queue itself is unbounded: jobs submitted while every worker
//! is busy wait in line.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio::time::timeout;

pub struct WorkerPool<T> {
    sender: mpsc::UnboundedSender<T>,
    workers: JoinSet<()>,
}

impl<T> WorkerPool<T>
where
    T: Send + 'static,
{
    /// Start `size` workers (at least one), each running `handler` per job.
    pub fn new<F, Fut>(size: usize, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let size = size.max(1);
        let (sender, receiver) = mpsc::unbounded_channel::<T>();
        let receiver = Arc::new(Mutex::new(receiver));
        let handler = Arc::new(handler);

        let mut workers = JoinSet::new();
        for id in 0..size {
            let receiver = Arc::clone(&receiver);
            let handler = Arc::clone(&handler);

            workers.spawn(async move {
                loop {
                    // Only the idle worker holding the lock waits on the queue
                    let job = receiver.lock().await.recv().await;
                    match job {
                        Some(job) => (*handler)(job).await,
                        None => break,
                    }
                }
                tracing::debug!(worker = id, "Worker stopped");
            });
        }

        Self { sender, workers }
    }

    /// Queue a job for the next free worker
    pub fn submit(&self, job: T) -> anyhow::Result<()> {
        self.sender
            .send(job)
            .map_err(|_| anyhow::anyhow!("worker pool is shut down"))
    }

    /// Stop taking jobs and wait up to `grace` for queued and running jobs.
    ///
    /// Workers still busy after the grace period are aborted. Returns `true`
    /// if every job finished in time.
    pub async fn shutdown(self, grace: Duration) -> bool {
        let Self {
            sender,
            mut workers,
        } = self;
        drop(sender);

        let drained = timeout(grace, async {
            while workers.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !drained {
            tracing::warn!(
                remaining = workers.len(),
                grace_secs = grace.as_secs_f64(),
                "Workers still busy after grace period, cancelling"
            );
            workers.shutdown().await;
        }

        drained
    }
}
