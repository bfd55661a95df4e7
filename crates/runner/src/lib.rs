//! A concurrent application runner that manages long-running processes with
//! graceful shutdown.
//!
//! Named processes run concurrently until one fails or a shutdown signal
//! arrives; every process is then cancelled through a shared token and
//! closers execute under a timeout, regardless of how the processes ended.
//! `run` returns the first process error, leaving the exit code to the
//! caller.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A long-running process. Receives the shared cancellation token and is
/// expected to return promptly once it fires.
pub type Process = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// A cleanup function executed after every process has stopped.
pub type Closer = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

pub struct Runner {
    processes: Vec<(String, Process)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Add a process under a name used in logs and error context.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes
            .push((name.into(), Box::new(|token| Box::pin(process(token)))));
        self
    }

    /// Add a closer. Closers run concurrently after all processes stop, and
    /// all of them are attempted even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned cancellation token instead of a fresh one.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Run every process to completion, then the closers. Returns the first
    /// process failure, if any.
    pub async fn run(self) -> anyhow::Result<()> {
        let token = self.cancellation_token;
        let mut join_set: JoinSet<(String, anyhow::Result<()>)> = JoinSet::new();

        for (name, process) in self.processes {
            let process_token = token.clone();
            join_set.spawn(async move { (name, process(process_token).await) });
        }

        spawn_signal_watchers(token.clone());

        // Drain every process. The token fires on the first failure so the
        // rest shut down on their own; nothing is aborted mid-flight.
        let mut first_error: Option<anyhow::Error> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "process completed");
                }
                Ok((name, Err(err))) => {
                    error!(process = %name, error = %format!("{err:#}"), "process failed");
                    if first_error.is_none() {
                        first_error = Some(err.context(format!("process {name} failed")));
                    }
                    token.cancel();
                }
                Err(err) => {
                    error!(error = %err, "process panicked");
                    if first_error.is_none() {
                        first_error = Some(anyhow::anyhow!("process panicked: {err}"));
                    }
                    token.cancel();
                }
            }
        }

        if !self.closers.is_empty() {
            info!(timeout_ms = self.closer_timeout.as_millis() as u64, "running closers");
            match tokio::time::timeout(self.closer_timeout, run_closers(self.closers)).await {
                Ok(()) => info!("all closers completed"),
                Err(_) => error!(
                    timeout_ms = self.closer_timeout.as_millis() as u64,
                    "closers timed out"
                ),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spawn_signal_watchers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!(error = %err, "error setting up signal handler");
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM signal");
                token.cancel();
            }
            Err(err) => {
                error!(error = %err, "error setting up SIGTERM handler");
            }
        }
    });
}

async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();

    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => debug!("closer completed"),
            Ok(Err(err)) => error!(error = %format!("{err:#}"), "closer failed"),
            Err(err) => error!(error = %err, "closer panicked"),
        }
    }
}
