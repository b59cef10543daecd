use async_trait::async_trait;

use super::collection::FindOptions;
use super::filter::Filter;
use super::pipeline::Pipeline;
use crate::core::{Document, RecordId, Result};

/// Document store seam used by the repositories and the seeder.
///
/// Collections are created on first write; reading an unknown collection
/// behaves like reading an empty one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `documents` in one call and returns their ids in input order.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<RecordId>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<usize>;

    /// Sets the fields of `set` on one document. Fails with
    /// `StoreError::NotFound` when `id` does not exist.
    async fn update_one(&self, collection: &str, id: RecordId, set: Document) -> Result<()>;

    /// Ensures an ascending index on `field`. Returns `false` if it already existed.
    async fn create_index(&self, collection: &str, field: &str) -> Result<bool>;

    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>>;
}
