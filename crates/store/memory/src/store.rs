use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::debug;

use modreg_store::error::StoreError;
use modreg_store::store::BlobStore;

/// In-memory [`BlobStore`] backed by a [`DashMap`].
///
/// Intended for tests and dry runs. Listing takes a snapshot of the matching
/// keys when first polled, so writes made while a listing is in flight are
/// not observed by it.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        debug!(path = %path, size = data.len(), "storing object in memory");
        self.objects.insert(path.to_owned(), data);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        self.objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(path.to_owned()))
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.objects.contains_key(path))
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        let prefix = prefix.to_owned();
        stream::once(async move {
            let mut keys: Vec<String> = self
                .objects
                .iter()
                .filter(|entry| entry.key().starts_with(&prefix))
                .map(|entry| entry.key().clone())
                .collect();
            keys.sort();
            stream::iter(keys.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    fn source_url(&self, path: &str) -> String {
        format!("memory://{path}")
    }
}
