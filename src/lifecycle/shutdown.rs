//! Signal handling for graceful shutdown

use std::future::Future;
use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, warn};

/// Handles shutdown signals (SIGTERM, SIGINT)
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    ///
    /// Falls back to Ctrl-C alone if the Unix handlers cannot be installed.
    pub async fn wait(&self) {
        let handlers = signal(SignalKind::terminate())
            .and_then(|term| Ok((term, signal(SignalKind::interrupt())?)));

        let (mut sigterm, mut sigint) = match handlers {
            Ok(handlers) => handlers,
            Err(e) => {
                warn!(?e, "failed to register signal handlers, waiting for ctrl-c");
                wait_for_ctrl_c(tokio::signal::ctrl_c()).await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on ctrl-c; if the handler itself fails, never resolve
///
/// A failed handler must not be mistaken for a shutdown request.
async fn wait_for_ctrl_c<F>(ctrl_c: F)
where
    F: Future<Output = io::Result<()>>,
{
    match ctrl_c.await {
        Ok(()) => debug!("received ctrl-c"),
        Err(e) => {
            warn!(?e, "ctrl-c handler failed, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_failed_ctrl_c_never_resolves() {
        let failing = async { Err(io::Error::other("no handler")) };
        let result = tokio::time::timeout(Duration::from_secs(3600), wait_for_ctrl_c(failing)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ctrl_c_resolves() {
        wait_for_ctrl_c(async { Ok(()) }).await;
    }
}
