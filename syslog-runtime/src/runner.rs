//! Process supervisor: spawns long-running worker tasks and drives orderly
//! shutdown (spec §4.H, §6 "Signals INT/TERM initiate shutdown").

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::RuntimeError;

/// Default grace period given to in-flight work after a shutdown signal,
/// before outstanding tasks are aborted (spec default: 2s).
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A cooperative shutdown signal, cloned into every worker task.
///
/// Workers observe it with [`ShutdownSignal::is_shutting_down`] or by
/// awaiting [`ShutdownSignal::wait`] alongside their next suspension point
/// (a socket read or accept).
#[derive(Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    /// True once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&mut self) {
        if self.is_shutting_down() {
            return;
        }
        let _ = self.0.changed().await;
    }
}

/// Supervises worker tasks: starts them, waits for an interrupt, and drives
/// a bounded shutdown grace period before aborting stragglers.
pub struct Supervisor {
    name: String,
    grace: Duration,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Create a new supervisor with the default shutdown grace period.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_grace(name, DEFAULT_SHUTDOWN_GRACE)
    }

    /// Create a new supervisor with an explicit shutdown grace period.
    pub fn with_grace(name: impl Into<String>, grace: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            name: name.into(),
            grace,
            shutdown_tx,
            tasks: Vec::new(),
        }
    }

    /// Obtain a shutdown signal to hand to a worker.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.shutdown_tx.subscribe())
    }

    /// Spawn a worker task. The task is tracked and aborted if it is still
    /// running once the shutdown grace period elapses.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.push(handle);
    }

    /// Run until SIGINT or SIGTERM is received, then drive shutdown to
    /// completion.
    pub async fn run_until_signal(self) {
        wait_for_interrupt_or_terminate().await;
        tracing::info!(service = %self.name, "received shutdown signal");
        self.shutdown().await;
    }

    /// Broadcast shutdown, wait out the grace period, then abort any task
    /// still running.
    async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        tracing::info!(
            service = %self.name,
            grace_ms = self.grace.as_millis() as u64,
            "waiting for in-flight work to drain"
        );
        tokio::time::sleep(self.grace).await;

        let mut aborted = 0usize;
        for task in &self.tasks {
            if !task.is_finished() {
                task.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            tracing::warn!(service = %self.name, aborted, "aborted tasks still running after grace period");
        }

        for task in self.tasks {
            if let Err(join_err) = task.await {
                let err = RuntimeError::worker(join_err.to_string());
                tracing::error!(service = %self.name, error = %err, "worker task ended abnormally");
            }
        }

        tracing::info!(service = %self.name, "shutdown complete");
    }
}

/// Wait for either SIGINT (Ctrl+C) or SIGTERM. On non-Unix platforms only
/// Ctrl+C is observed.
async fn wait_for_interrupt_or_terminate() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
