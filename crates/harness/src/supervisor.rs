//! Server process management - locating, launching and stopping the artifact

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Grace period between SIGTERM and a hard kill
const TERM_GRACE: Duration = Duration::from_millis(500);

/// Launches the server artifact as a child process
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    artifact_name: String,
    launcher: Vec<String>,
    server_args: Vec<String>,
}

impl ProcessSupervisor {
    pub fn new(
        artifact_name: impl Into<String>,
        launcher: Vec<String>,
        server_args: Vec<String>,
    ) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            launcher,
            server_args,
        }
    }

    /// Return the first candidate that exists on disk
    pub fn locate_artifact(&self, candidates: &[PathBuf]) -> HarnessResult<PathBuf> {
        for candidate in candidates {
            if candidate.exists() {
                debug!("Found server artifact at {}", candidate.display());
                return Ok(candidate.canonicalize().unwrap_or_else(|_| candidate.clone()));
            }
        }

        Err(HarnessError::ArtifactNotFound {
            artifact: self.artifact_name.clone(),
            searched: candidates.to_vec(),
        })
    }

    /// Spawn the artifact without waiting for it to become ready
    pub fn start(&self, artifact: &Path) -> HarnessResult<ServerHandle> {
        let mut cmd = match self.launcher.split_first() {
            Some((program, args)) => {
                let mut cmd = Command::new(program);
                cmd.args(args).arg(artifact);
                cmd
            }
            None => Command::new(artifact),
        };
        cmd.args(&self.server_args);

        // Only port readiness matters, so server output is discarded.
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().map_err(|source| HarnessError::Launch {
            path: artifact.to_path_buf(),
            source,
        })?;

        info!("Launched {} (pid: {})", artifact.display(), child.id());
        Ok(ServerHandle { child: Some(child) })
    }
}

/// Ownership token for a launched server process
#[derive(Debug)]
pub struct ServerHandle {
    child: Option<Child>,
}

impl ServerHandle {
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Whether the child is still running
    pub fn is_alive(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop the server. Safe to call repeatedly and on an exited child.
    pub fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Server (pid: {}) already exited: {}", child.id(), status);
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Cannot query server (pid: {}): {}", child.id(), e),
        }

        info!("Stopping server (pid: {})", child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                let deadline = std::time::Instant::now() + TERM_GRACE;
                while std::time::Instant::now() < deadline {
                    if let Ok(Some(_)) = child.try_wait() {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }

        // Force kill if still running
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}
