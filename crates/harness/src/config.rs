//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::endpoint::ServerEndpoint;
use crate::error::{HarnessError, HarnessResult};
use crate::lifecycle::ReadinessPolicy;
use crate::probe::PortProbe;

/// Server artifact shipped alongside the test project
pub const DEFAULT_ARTIFACT: &str = "runTodoManagerRestAPI-1.5.5.jar";

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Host the service listens on
    pub host: String,

    /// Port the service listens on
    pub port: u16,

    /// File name of the runnable server artifact
    pub artifact_name: String,

    /// Candidate artifact locations, checked in order
    pub search_paths: Vec<PathBuf>,

    /// Program and leading arguments used to run the artifact (empty = run it directly)
    pub launcher: Vec<String>,

    /// Extra arguments appended after the artifact path
    pub server_args: Vec<String>,

    /// Readiness polling
    pub readiness: ReadinessConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 4567,
            artifact_name: DEFAULT_ARTIFACT.to_string(),
            search_paths: default_search_paths(DEFAULT_ARTIFACT),
            launcher: vec!["java".to_string(), "-jar".to_string()],
            server_args: Vec::new(),
            readiness: ReadinessConfig::default(),
        }
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Number of probes before giving up
    pub attempts: u32,

    /// Pause between probes
    pub delay_ms: u64,

    /// Connect timeout for a single probe
    pub probe_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: 20,
            delay_ms: 500,
            probe_timeout_ms: 5000,
        }
    }
}

/// Project root and module root invocations see the artifact at different relative paths.
pub fn default_search_paths(artifact: &str) -> Vec<PathBuf> {
    vec![
        Path::new("..").join(artifact),
        PathBuf::from(artifact),
        Path::new("../..").join(artifact),
    ]
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> HarnessResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `TODO_HARNESS_*` environment overrides
    pub fn apply_env(self) -> HarnessResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        if let Some(host) = lookup("TODO_HARNESS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("TODO_HARNESS_PORT") {
            self.port = port.parse().map_err(|_| {
                HarnessError::Config(format!("TODO_HARNESS_PORT is not a port number: {}", port))
            })?;
        }
        if let Some(artifact) = lookup("TODO_HARNESS_ARTIFACT") {
            self.search_paths.insert(0, PathBuf::from(artifact));
        }
        Ok(self)
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.host.clone(), self.port)
    }

    pub fn probe(&self) -> PortProbe {
        PortProbe::new(Duration::from_millis(self.readiness.probe_timeout_ms))
    }

    pub fn readiness(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            attempts: self.readiness.attempts,
            delay: Duration::from_millis(self.readiness.delay_ms),
        }
    }
}
