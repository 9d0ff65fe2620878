use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::config::Config;
use crate::files::StaticFiles;
use crate::http::connection::{Connection, Deadlines};
use crate::server::pool::WorkerPool;

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Owns the listening socket and hands accepted connections to the workers.
pub struct Listener {
    listener: TcpListener,
    files: Arc<StaticFiles>,
    workers: usize,
    deadlines: Deadlines,
    grace: Duration,
}

impl Listener {
    /// Bind the listening socket. Failure here is fatal for the server.
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let files = Arc::new(StaticFiles::new(&cfg.web_root)?);

        let listener = TcpListener::bind(cfg.listen_addr())
            .await
            .with_context(|| format!("Server cannot listen on port {}", cfg.port))?;

        info!(
            "Running server on {} with web root {} and {} workers",
            listener.local_addr()?,
            files.root().display(),
            cfg.workers
        );

        Ok(Self {
            listener,
            files,
            workers: cfg.workers,
            deadlines: cfg.deadlines(),
            grace: cfg.shutdown_grace(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Then the socket is closed, the pool stops taking work, and in-flight
    /// connections get the grace period to finish before being cancelled.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            files,
            workers,
            deadlines,
            grace,
        } = self;

        let pool = WorkerPool::new(workers, move |(socket, peer): (TcpStream, SocketAddr)| {
            let files = Arc::clone(&files);
            async move {
                let conn = Connection::new(socket, peer.to_string(), files, deadlines);
                if let Err(e) = conn.run().await {
                    tracing::error!("Connection error from {}: {:#}", peer, e);
                }
            }
        });

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                res = listener.accept() => match res {
                    Ok((socket, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        pool.submit((socket, peer))?;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Cannot accept client");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }

        drop(listener);

        if pool.shutdown(grace).await {
            info!("All connections finished, server stopped");
        } else {
            info!("Server stopped, unfinished connections were cancelled");
        }

        Ok(())
    }
}

/// Bind and serve until `shutdown` resolves.
pub async fn run<F>(cfg: &Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    Listener::bind(cfg).await?.serve(shutdown).await
}
