//! Server lifecycle - reuse a running server or launch and await one

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::endpoint::ServerEndpoint;
use crate::error::{HarnessError, HarnessResult};
use crate::probe::PortProbe;
use crate::supervisor::{ProcessSupervisor, ServerHandle};

/// Bounded readiness polling
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl ReadinessPolicy {
    /// Total time spent sleeping when the server never comes up
    pub fn budget(&self) -> Duration {
        self.delay * self.attempts
    }
}

/// Who owns the server a session talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOrigin {
    /// Already listening before the session started; never stopped by us
    External,
    /// Launched by this session
    Spawned { pid: u32 },
}

/// A ready server for the duration of a test session.
///
/// Dropping the session stops the server if, and only if, the session
/// launched it.
#[derive(Debug)]
pub struct ServerSession {
    endpoint: ServerEndpoint,
    origin: ServerOrigin,
    handle: Option<ServerHandle>,
}

impl ServerSession {
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn base_url(&self) -> &str {
        &self.endpoint.base_url
    }

    pub fn origin(&self) -> ServerOrigin {
        self.origin
    }

    pub fn spawned(&self) -> bool {
        matches!(self.origin, ServerOrigin::Spawned { .. })
    }

    /// Release the server now instead of at drop
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!("Session ended, stopping server at {}", self.endpoint);
            handle.terminate();
        }
    }
}

impl Drop for ServerSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Ensures exactly one instance of the service is reachable
pub struct ServerLifecycleManager {
    endpoint: ServerEndpoint,
    probe: PortProbe,
    supervisor: ProcessSupervisor,
    search_paths: Vec<std::path::PathBuf>,
    readiness: ReadinessPolicy,
    cancel: Arc<AtomicBool>,
}

impl ServerLifecycleManager {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            endpoint: config.endpoint(),
            probe: config.probe(),
            supervisor: ProcessSupervisor::new(
                config.artifact_name.clone(),
                config.launcher.clone(),
                config.server_args.clone(),
            ),
            search_paths: config.search_paths.clone(),
            readiness: config.readiness(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting this flag abandons a pending readiness wait; the launched
    /// server is stopped and `ensure_running` returns `Interrupted`.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// [`ensure_running`](Self::ensure_running), except that a missing
    /// artifact yields `None` when `skip_if_unavailable` is set.
    pub fn start_session(&self, skip_if_unavailable: bool) -> HarnessResult<Option<ServerSession>> {
        match self.ensure_running() {
            Ok(session) => Ok(Some(session)),
            Err(e @ HarnessError::ArtifactNotFound { .. }) if skip_if_unavailable => {
                warn!("No server available, skipping: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Reuse a listening server, or launch one and block until it accepts
    /// connections.
    pub fn ensure_running(&self) -> HarnessResult<ServerSession> {
        let ServerEndpoint { host, port, .. } = &self.endpoint;

        if self.probe.in_use(host, *port) {
            info!("Reusing server already listening at {}", self.endpoint);
            return Ok(ServerSession {
                endpoint: self.endpoint.clone(),
                origin: ServerOrigin::External,
                handle: None,
            });
        }

        let artifact = self.supervisor.locate_artifact(&self.search_paths)?;
        info!("No server at {}, launching {}", self.endpoint, artifact.display());

        // Dropped (and so stopped) if readiness fails.
        let handle = self.supervisor.start(&artifact)?;
        let waited = self.wait_for_ready()?;

        let pid = handle.pid().unwrap_or_default();
        info!("Server is ready at {} after {:?}", self.endpoint, waited);

        Ok(ServerSession {
            endpoint: self.endpoint.clone(),
            origin: ServerOrigin::Spawned { pid },
            handle: Some(handle),
        })
    }

    fn wait_for_ready(&self) -> HarnessResult<Duration> {
        let start = Instant::now();
        let ServerEndpoint { host, port, .. } = &self.endpoint;

        for attempt in 1..=self.readiness.attempts {
            if self.cancel.load(Ordering::SeqCst) {
                info!("Startup cancelled after {:?}", start.elapsed());
                return Err(HarnessError::Interrupted);
            }
            if self.probe.in_use(host, *port) {
                return Ok(start.elapsed());
            }
            debug!(
                "Server not accepting connections yet (attempt {}/{})",
                attempt, self.readiness.attempts
            );
            std::thread::sleep(self.readiness.delay);
        }

        Err(HarnessError::ServerNotReady {
            attempts: self.readiness.attempts,
            waited: start.elapsed(),
        })
    }
}
