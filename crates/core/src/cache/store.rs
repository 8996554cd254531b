//! The storage seam the worker is written against.

use super::{RequestKey, ResponseSnapshot};
use crate::Error;

/// Key/value snapshot store partitioned into named generations.
///
/// Every operation is a suspension point. Implementations never lock across
/// calls: each `put` replaces a whole entry, so concurrent writers can only
/// race on which snapshot wins.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Create the generation if it does not exist yet.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Look up an entry in one generation.
    async fn match_entry(&self, generation: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Store an entry, creating the generation if needed and replacing any
    /// previous snapshot under the same key.
    async fn put(&self, generation: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Delete a generation and all its entries. Returns whether it existed.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Names of all generations, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Keys of the entries held by one generation.
    async fn entry_keys(&self, generation: &str) -> Result<Vec<RequestKey>, Error>;
}
