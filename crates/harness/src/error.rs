//! Error types for the todo harness

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(
        "Cannot find {artifact} (searched: {}). Please start the server manually: java -jar {artifact}",
        display_paths(.searched)
    )]
    ArtifactNotFound {
        artifact: String,
        searched: Vec<PathBuf>,
    },

    #[error("Failed to start server {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server did not start in time: port not reachable after {attempts} attempts ({waited:?})")]
    ServerNotReady { attempts: u32, waited: Duration },

    #[error("Interrupted while waiting for the server to start")]
    Interrupted,

    #[error("Could not restore {collection} state: {action} of {id} failed: {source}")]
    ReconciliationFailure {
        collection: &'static str,
        id: String,
        action: ReconcileAction,
        #[source]
        source: Box<HarnessError>,
    },

    #[error("{method} {url} returned {status}: {body}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Corrective write that failed during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    List,
    Update,
    Delete,
}

impl std::fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ReconcileAction::List => "listing",
            ReconcileAction::Update => "update",
            ReconcileAction::Delete => "delete",
        })
    }
}

impl HarnessError {
    /// Errors that must abort the whole session rather than a single test.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::ArtifactNotFound { .. }
                | HarnessError::Launch { .. }
                | HarnessError::ServerNotReady { .. }
                | HarnessError::Interrupted
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type HarnessResult<T> = Result<T, HarnessError>;
