use async_trait::async_trait;

use crate::envelope::RecordEnvelope;
use crate::error::StoreResult;
use crate::filter::{Filter, IndexSpec, Sort};

/// Document-oriented secondary store.
///
/// All implementations must satisfy these invariants:
/// - "Record absent" is `Ok(None)` (or an empty visit), never an error.
/// - Staged session writes become visible atomically at commit; a session
///   dropped without commit writes nothing.
/// - Info entries are small key/value pairs, overwritten in place.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Visit every record in `collection` matching `filter`, in `sort`
    /// order when given, stopping after `limit` records or when the
    /// visitor returns `false`.
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
        limit: Option<u64>,
        visit: &mut (dyn FnMut(RecordEnvelope) -> bool + Send),
    ) -> StoreResult<()>;

    /// The first record matching `filter` in `sort` order, if any.
    async fn get_one(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> StoreResult<Option<RecordEnvelope>>;

    /// Delete every record matching `filter`; returns how many went.
    async fn bulk_delete(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Declare an index on a collection.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> StoreResult<()>;

    /// Number of records matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Read a small info entry by key.
    async fn get_info(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write a small info entry, overwriting any previous value.
    async fn set_info(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Open a projection session for staging a batch of records.
    async fn session(&self) -> StoreResult<Box<dyn ProjectionSession>>;
}

/// A staged batch of record writes, committed atomically.
#[async_trait]
pub trait ProjectionSession: Send {
    /// Stage a record for `collection`. Nothing is visible until commit.
    fn stage(&mut self, collection: &str, record: RecordEnvelope);

    /// Atomically write every staged record.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
