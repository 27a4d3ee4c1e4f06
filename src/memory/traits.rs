use super::types::{Document, MetadataFilter, Partition};
use std::future::Future;
use std::pin::Pin;

/// Access pattern required of the backing key-value-with-similarity store.
///
/// Every partition supports the same four operations; callers above this
/// seam decide how failures degrade.
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    fn health_check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Insert or replace by id.
    fn upsert<'a>(
        &'a self,
        partition: Partition,
        document: Document,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    fn get<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<Document>>> + Send + 'a>>;

    /// Up to `k` documents ordered by similarity to `text`.
    ///
    /// An empty `text` returns the most recently written documents that
    /// match `filter`.
    fn query_similar<'a>(
        &'a self,
        partition: Partition,
        text: &'a str,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>>;

    /// Exhaustive scan, in no particular order.
    fn get_all<'a>(
        &'a self,
        partition: Partition,
        filter: Option<&'a MetadataFilter>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Document>>> + Send + 'a>>;

    /// Returns whether a document was removed.
    fn delete<'a>(
        &'a self,
        partition: Partition,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;
}
