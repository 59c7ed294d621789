//! Snapshot and restore of remote state around a test
//!
//! A [`Snapshot`] captures the collection before a test runs. Reconciling
//! against it afterwards deletes records the test introduced and writes the
//! tracked fields of pre-existing records back to their captured values.
//!
//! Records the test *deleted* are not recreated: the service assigns ids, so a
//! recreated record would have a different identity. They are reported in
//! [`ReconcileReport::missing`] instead. Relationship links are not tracked
//! either; tests that link records must only link records they created.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::collection::RemoteCollection;
use crate::error::{HarnessError, HarnessResult, ReconcileAction};
use crate::model::TrackedRecord;

/// Point-in-time capture of a collection, keyed by id
#[derive(Debug, Clone)]
pub struct Snapshot<R> {
    records: HashMap<String, R>,
}

impl<R: TrackedRecord> Snapshot<R> {
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.id().to_string(), r))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.get(id)
    }
}

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Ids introduced by the test and deleted
    pub deleted: Vec<String>,
    /// Ids whose tracked fields were written back
    pub restored: Vec<String>,
    /// Snapshot ids no longer present; not recreated
    pub missing: Vec<String>,
}

impl ReconcileReport {
    /// Whether the collection is back to the snapshot
    pub fn is_exact(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Snapshot-before / reconcile-after over one remote collection
pub struct StateReconciler<C> {
    collection: C,
}

impl<C: RemoteCollection> StateReconciler<C> {
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub async fn snapshot(&self) -> HarnessResult<Snapshot<C::Record>> {
        let records = self.collection.list_all().await?;
        debug!("Captured {} {}", records.len(), self.collection.name());
        Ok(Snapshot::from_records(records))
    }

    /// Bring the collection back to `prior`.
    ///
    /// Visits the current listing, so cost tracks what the test left behind.
    /// Pre-existing records are rewritten unconditionally. The first failing
    /// write aborts the pass; nothing is retried.
    pub async fn reconcile(&self, prior: &Snapshot<C::Record>) -> HarnessResult<ReconcileReport> {
        let name = self.collection.name();
        let current = self
            .collection
            .list_all()
            .await
            .map_err(|e| failure(name, "*", ReconcileAction::List, e))?;

        let mut report = ReconcileReport::default();
        let mut seen = Vec::with_capacity(current.len());

        for record in &current {
            let id = record.id();
            seen.push(id);

            match prior.get(id) {
                None => {
                    debug!("Deleting {} {} introduced by test", name, id);
                    self.collection
                        .delete(id)
                        .await
                        .map_err(|e| failure(name, id, ReconcileAction::Delete, e))?;
                    report.deleted.push(id.to_string());
                }
                Some(original) => {
                    self.collection
                        .update(id, &original.tracked_fields())
                        .await
                        .map_err(|e| failure(name, id, ReconcileAction::Update, e))?;
                    report.restored.push(id.to_string());
                }
            }
        }

        let mut missing: Vec<String> = prior
            .records
            .keys()
            .filter(|id| !seen.contains(&id.as_str()))
            .cloned()
            .collect();
        missing.sort();
        if !missing.is_empty() {
            warn!(
                "{} {} deleted by test cannot be recreated: {:?}",
                missing.len(),
                name,
                missing
            );
        }
        report.missing = missing;

        Ok(report)
    }
}

fn failure(
    collection: &'static str,
    id: &str,
    action: ReconcileAction,
    source: HarnessError,
) -> HarnessError {
    HarnessError::ReconciliationFailure {
        collection,
        id: id.to_string(),
        action,
        source: Box::new(source),
    }
}
