//! Signal-driven shutdown.
//!
//! [`ShutdownCoordinator::install`] spawns a listener that waits for SIGINT
//! or SIGTERM, runs a cleanup action once and then fires a [`ShutdownSignal`].
//! The main loop selects on that signal; the entry point decides the exit
//! code.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Completion side of the shutdown handshake, held by the main loop.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: oneshot::Receiver<()>,
    fired: bool,
    closed: bool,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been requested and cleanup has run.
    ///
    /// Never resolves if the listener died without a signal, so a broken
    /// handler cannot end the run. Cancel safe.
    pub async fn requested(&mut self) {
        if self.fired {
            return;
        }
        if !self.closed {
            match (&mut self.rx).await {
                Ok(()) => {
                    self.fired = true;
                    return;
                }
                Err(_) => {
                    debug!("Shutdown listener gone, shutdown can no longer be requested");
                    self.closed = true;
                }
            }
        }
        std::future::pending::<()>().await
    }

    /// Non-blocking check.
    pub fn is_requested(&mut self) -> bool {
        if !self.fired && !self.closed {
            match self.rx.try_recv() {
                Ok(()) => self.fired = true,
                Err(oneshot::error::TryRecvError::Closed) => self.closed = true,
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.fired
    }
}

pub struct ShutdownCoordinator;

impl ShutdownCoordinator {
    /// Listens for SIGINT/SIGTERM (Ctrl-C elsewhere). Must be called inside a
    /// tokio runtime.
    pub fn install<F>(cleanup: F) -> ShutdownSignal
    where
        F: FnOnce() + Send + 'static,
    {
        Self::install_with(termination_signal(), cleanup)
    }

    /// Like [`install`](Self::install) with a custom trigger. The trigger's
    /// error means no signal can be received; it is logged and shutdown is
    /// never requested.
    pub fn install_with<S, F>(signal: S, cleanup: F) -> ShutdownSignal
    where
        S: Future<Output = std::io::Result<()>> + Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let listener = tokio::spawn(async move {
            if let Err(e) = signal.await {
                error!(error = %e, "Failed to listen for termination signals");
                return;
            }
            info!("Termination signal received, shutting down");
            run_cleanup(cleanup);
            // The main loop may already be gone.
            let _ = tx.send(());
        });
        tokio::spawn(async move {
            if let Err(e) = listener.await {
                if e.is_panic() {
                    error!(error = %e, "Shutdown listener panicked");
                } else {
                    debug!(error = %e, "Shutdown listener cancelled");
                }
            }
        });
        ShutdownSignal {
            rx,
            fired: false,
            closed: false,
        }
    }
}

fn run_cleanup<F: FnOnce()>(cleanup: F) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(cleanup)) {
        let msg = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(panic = %msg, "Shutdown cleanup panicked");
    }
}

#[cfg(unix)]
async fn termination_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => debug!("Received SIGTERM"),
        _ = sigint.recv() => debug!("Received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn termination_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cleanup_runs_before_signal_fires() {
        let (trigger, wait) = oneshot::channel::<()>();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut shutdown = ShutdownCoordinator::install_with(
            async move {
                let _ = wait.await;
                Ok(())
            },
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        assert!(!shutdown.is_requested());

        trigger.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), shutdown.requested())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Repeated waits return immediately and do not rerun cleanup.
        shutdown.requested().await;
        assert!(shutdown.is_requested());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_cleanup_is_contained() {
        let mut shutdown =
            ShutdownCoordinator::install_with(async { Ok(()) }, || panic!("cleanup failed"));
        tokio::time::timeout(Duration::from_secs(5), shutdown.requested())
            .await
            .unwrap();
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn test_listener_failure_never_requests_shutdown() {
        let mut shutdown = ShutdownCoordinator::install_with(
            async { Err(std::io::Error::new(std::io::ErrorKind::Other, "no signals")) },
            || {},
        );
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.requested()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_requested());
    }

    #[tokio::test]
    async fn test_panicking_listener_never_requests_shutdown() {
        async fn failing_listener() -> std::io::Result<()> {
            panic!("listener failed")
        }

        let mut shutdown = ShutdownCoordinator::install_with(failing_listener(), || {});
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.requested()).await;
        assert!(waited.is_err());
    }
}
