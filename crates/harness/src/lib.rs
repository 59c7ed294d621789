//! Todo Manager Test Harness
//!
//! Test-support infrastructure for black-box testing of the todo manager REST
//! API over the network:
//! - Reuses a running server, or launches the server artifact and waits for
//!   its port to accept connections
//! - Stops a server it launched when the session ends
//! - Snapshots remote collections before each test and reconciles them
//!   afterwards, so tests can run in any order
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Test session (owner)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ServerLifecycleManager                                     │
//! │    ├── PortProbe::in_use(host, port) -> bool                │
//! │    ├── ProcessSupervisor::locate_artifact / start           │
//! │    └── ensure_running() -> ServerSession (stops on drop)    │
//! │  ShutdownSignal: SIGINT/SIGTERM end the session cleanly     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Per test (SuiteRunner)                                     │
//! │    ├── StateReconciler::snapshot() -> Snapshot              │
//! │    ├── test body (TodoClient)                               │
//! │    └── StateReconciler::reconcile(&snapshot)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod probe;
pub mod reconcile;
pub mod runner;
pub mod shutdown;
pub mod supervisor;
pub mod xml;

pub use client::{ApiResponse, TodoClient};
pub use collection::RemoteCollection;
pub use config::HarnessConfig;
pub use endpoint::ServerEndpoint;
pub use error::{HarnessError, HarnessResult};
pub use lifecycle::{ServerLifecycleManager, ServerOrigin, ServerSession};
pub use probe::PortProbe;
pub use reconcile::{ReconcileReport, Snapshot, StateReconciler};
pub use runner::{SuiteRunner, SuiteStatus, TestCase, TestOutcome};
pub use shutdown::ShutdownSignal;
pub use supervisor::{ProcessSupervisor, ServerHandle};
