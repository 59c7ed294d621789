//! Process shutdown requests (Ctrl-C, SIGTERM)

use crate::error::HarnessResult;

/// Listens for shutdown signals.
///
/// Handlers are registered by [`install`](Self::install), so a signal that
/// arrives before the first [`recv`](Self::recv) is still delivered.
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    /// Must be called from within a tokio runtime
    pub fn install() -> HarnessResult<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next shutdown request; returns the signal name
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
impl ShutdownSignal {
    pub fn install() -> HarnessResult<Self> {
        Ok(Self {})
    }

    pub async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl-C"
    }
}
