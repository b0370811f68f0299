use std::future::Future;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::error::StoreError;

/// Raw key/blob storage for one physical backend.
///
/// Paths are opaque `/`-separated keys; the store attaches no meaning to
/// them. Writes overwrite unconditionally: "already exists" semantics belong
/// to the caller. Implementations must be `Send + Sync`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend identifier used in log fields (e.g. `"s3"`).
    fn name(&self) -> &str;

    /// Write `data` at `path`, replacing any existing object.
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError>;

    /// Write the contents of a local file at `path`.
    ///
    /// The default reads the whole file and delegates to [`put`](Self::put).
    async fn put_file(&self, path: &str, local: &Path) -> Result<(), StoreError> {
        let data = tokio::fs::read(local).await?;
        self.put(path, Bytes::from(data)).await
    }

    /// Read the object at `path`. Returns [`StoreError::NotFound`] if absent.
    async fn get(&self, path: &str) -> Result<Bytes, StoreError>;

    /// Check whether an object exists at `path`.
    ///
    /// Absence is `Ok(false)`; only transport failures are errors.
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Stream every key that starts with `prefix`.
    ///
    /// The stream is lazy and finite. It cannot be restarted; call `list`
    /// again for a fresh pass.
    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>>;

    /// Consumer-facing locator for the object at `path`.
    fn source_url(&self, path: &str) -> String;
}

/// One page of keys from a paginated listing API.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Keys on this page.
    pub keys: Vec<String>,
    /// Continuation token for the next page; `None` or empty ends the listing.
    pub next_token: Option<String>,
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Turn a page-fetching function into a lazy key stream.
///
/// `fetch_page` receives the continuation token of the previous page (`None`
/// for the first call). Pages are requested only as the stream is polled.
pub fn paginate<'a, F, Fut>(fetch_page: F) -> BoxStream<'a, Result<String, StoreError>>
where
    F: FnMut(Option<String>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<ListPage, StoreError>> + Send + 'a,
{
    stream::try_unfold((fetch_page, Cursor::Start), |(mut fetch, cursor)| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok::<_, StoreError>(None),
        };
        let page = fetch(token).await?;
        let next = match page.next_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Done,
        };
        let keys = stream::iter(page.keys.into_iter().map(Ok::<_, StoreError>));
        Ok(Some((keys, (fetch, next))))
    })
    .try_flatten()
    .boxed()
}

/// Drain a listing into a vector.
pub async fn collect_keys(store: &dyn BlobStore, prefix: &str) -> Result<Vec<String>, StoreError> {
    store.list(prefix).try_collect().await
}
