//! Remote collection abstraction used by reconciliation

use async_trait::async_trait;

use crate::error::HarnessResult;
use crate::model::TrackedRecord;

/// A server-side collection whose identifiers are assigned by the service
#[async_trait]
pub trait RemoteCollection: Send + Sync {
    type Record: TrackedRecord<Fields = Self::Fields> + Clone + Send + Sync;
    type Fields: Send + Sync;

    /// Name used in logs and errors (e.g. `todos`)
    fn name(&self) -> &'static str;

    /// Every record currently in the collection; an absent collection is empty
    async fn list_all(&self) -> HarnessResult<Vec<Self::Record>>;

    async fn create(&self, fields: &Self::Fields) -> HarnessResult<Self::Record>;

    /// Overwrite the given fields of an existing record
    async fn update(&self, id: &str, fields: &Self::Fields) -> HarnessResult<()>;

    async fn delete(&self, id: &str) -> HarnessResult<()>;
}
