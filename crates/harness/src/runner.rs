//! Suite runner: random-order execution with per-test state isolation

use futures::future::BoxFuture;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::{Projects, TodoClient, Todos};
use crate::error::{HarnessError, HarnessResult};
use crate::model::{ProjectRecord, TodoRecord};
use crate::reconcile::{ReconcileReport, Snapshot, StateReconciler};

/// Future returned by a test body
pub type CaseFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A single test against the live service
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub body: fn(TodoClient) -> CaseFuture,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// How a test ended. Teardown problems are kept apart from assertion
/// failures: they mean isolation was lost, not that the service misbehaved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed { reason: String },
    TeardownFailed { reason: String },
    FailedWithTeardown { reason: String, teardown: String },
    SetupFailed { reason: String },
}

impl TestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn is_teardown_failure(&self) -> bool {
        matches!(
            self,
            TestOutcome::TeardownFailed { .. } | TestOutcome::FailedWithTeardown { .. }
        )
    }
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: TestOutcome,
    pub duration_ms: u64,
    /// Records the test created and reconciliation removed
    pub cleaned_up: usize,
    /// Pre-existing records the test deleted; these stay gone
    pub unrecoverable: Vec<String>,
}

/// Result of running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub seed: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub teardown_failures: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// How a suite invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteStatus {
    Passed,
    Failed,
    /// No server and no artifact, with skipping explicitly requested
    Skipped,
    Interrupted,
}

impl SuiteStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            SuiteStatus::Passed | SuiteStatus::Skipped => 0,
            SuiteStatus::Failed => 1,
            SuiteStatus::Interrupted => 130,
        }
    }
}

/// Process exit code for a suite invocation. Any error, a missing server
/// artifact included, means the session could not run and exits 2.
pub fn exit_code(result: &HarnessResult<SuiteStatus>) -> i32 {
    match result {
        Ok(status) => status.exit_code(),
        Err(_) => 2,
    }
}

/// Snapshots of every tracked collection
pub struct IsolationSnapshot {
    todos: Snapshot<TodoRecord>,
    projects: Snapshot<ProjectRecord>,
}

/// Combined reconciliation outcome
#[derive(Debug, Clone, Default)]
pub struct IsolationReport {
    pub todos: ReconcileReport,
    pub projects: ReconcileReport,
}

/// Snapshot/reconcile over the todo and project collections
pub struct Isolation {
    todos: StateReconciler<Todos>,
    projects: StateReconciler<Projects>,
}

impl Isolation {
    pub fn new(client: &TodoClient) -> Self {
        Self {
            todos: StateReconciler::new(client.todos()),
            projects: StateReconciler::new(client.projects()),
        }
    }

    pub async fn capture(&self) -> HarnessResult<IsolationSnapshot> {
        Ok(IsolationSnapshot {
            todos: self.todos.snapshot().await?,
            projects: self.projects.snapshot().await?,
        })
    }

    /// Reconcile every collection, even after one fails; the first error wins.
    pub async fn restore(&self, snapshot: &IsolationSnapshot) -> HarnessResult<IsolationReport> {
        let todos = self.todos.reconcile(&snapshot.todos).await;
        let projects = self.projects.reconcile(&snapshot.projects).await;
        Ok(IsolationReport {
            todos: todos?,
            projects: projects?,
        })
    }
}

/// Configuration for the suite runner
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Fixed ordering seed (None = random)
    pub seed: Option<u64>,

    /// Run only tests carrying this tag
    pub tag: Option<String>,

    /// Run only the test with this name
    pub name: Option<String>,

    /// Output directory for results
    pub output_dir: PathBuf,
}

/// Runs registered tests in a shuffled order against one client
pub struct SuiteRunner {
    client: TodoClient,
    isolation: Isolation,
    config: RunnerConfig,
    cases: Vec<TestCase>,
}

impl SuiteRunner {
    pub fn new(client: TodoClient, config: RunnerConfig) -> Self {
        Self {
            isolation: Isolation::new(&client),
            client,
            config,
            cases: Vec::new(),
        }
    }

    pub fn register(&mut self, cases: impl IntoIterator<Item = TestCase>) {
        self.cases.extend(cases);
    }

    /// Tests selected by the configured name and tag filters
    pub fn selected(&self) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|c| self.config.name.as_deref().map_or(true, |n| c.name == n))
            .filter(|c| {
                self.config
                    .tag
                    .as_deref()
                    .map_or(true, |t| c.tags.contains(&t))
            })
            .copied()
            .collect()
    }

    /// Run every selected test in a seeded random order
    pub async fn run_all(&self) -> TestSuiteResult {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut cases = self.selected();
        cases.shuffle(&mut StdRng::seed_from_u64(seed));

        let started_at = chrono::Utc::now();
        let start = Instant::now();
        info!("Running {} test(s) with seed {}", cases.len(), seed);

        let mut results = Vec::with_capacity(cases.len());
        for case in &cases {
            let result = self.run_case(case).await;
            match &result.outcome {
                TestOutcome::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                TestOutcome::Failed { reason } => error!("✗ {} - {}", result.name, reason),
                TestOutcome::SetupFailed { reason } => {
                    error!("✗ {} - setup failed: {}", result.name, reason)
                }
                TestOutcome::TeardownFailed { reason } => {
                    error!("✗ {} - passed, but teardown failed: {}", result.name, reason)
                }
                TestOutcome::FailedWithTeardown { reason, teardown } => error!(
                    "✗ {} - {} (teardown also failed: {})",
                    result.name, reason, teardown
                ),
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.outcome.is_success()).count();
        let teardown_failures = results
            .iter()
            .filter(|r| r.outcome.is_teardown_failure())
            .count();
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} teardown failures) in {} ms, seed {}",
            passed,
            results.len() - passed,
            teardown_failures,
            duration_ms,
            seed
        );

        TestSuiteResult {
            seed,
            started_at,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            teardown_failures,
            duration_ms,
            results,
        }
    }

    /// Snapshot, run the body, then reconcile regardless of the body's result
    pub async fn run_case(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();
        debug!("Running test: {}", case.name);

        let snapshot = match self.isolation.capture().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return TestResult {
                    name: case.name.to_string(),
                    outcome: TestOutcome::SetupFailed {
                        reason: e.to_string(),
                    },
                    duration_ms: start.elapsed().as_millis() as u64,
                    cleaned_up: 0,
                    unrecoverable: Vec::new(),
                };
            }
        };

        let body = AssertUnwindSafe((case.body)(self.client.clone()))
            .catch_unwind()
            .await;
        let failure = match body {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{:#}", e)),
            Err(panic) => Some(panic_message(panic.as_ref())),
        };

        let teardown = self.isolation.restore(&snapshot).await;
        let (cleaned_up, unrecoverable) = match &teardown {
            Ok(report) => {
                let mut missing = report.todos.missing.clone();
                missing.extend(report.projects.missing.iter().cloned());
                if !missing.is_empty() {
                    warn!("{} deleted pre-existing records: {:?}", case.name, missing);
                }
                (report.todos.deleted.len() + report.projects.deleted.len(), missing)
            }
            Err(_) => (0, Vec::new()),
        };

        let outcome = match (failure, teardown) {
            (None, Ok(_)) => TestOutcome::Passed,
            (Some(reason), Ok(_)) => TestOutcome::Failed { reason },
            (None, Err(e)) => TestOutcome::TeardownFailed {
                reason: teardown_reason(&e),
            },
            (Some(reason), Err(e)) => TestOutcome::FailedWithTeardown {
                reason,
                teardown: teardown_reason(&e),
            },
        };

        TestResult {
            name: case.name.to_string(),
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
            cleaned_up,
            unrecoverable,
        }
    }

    /// Write suite results to `test-results.json` in the output directory
    pub fn write_results(&self, results: &TestSuiteResult) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn teardown_reason(e: &HarnessError) -> String {
    format!("state not restored: {}", e)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
