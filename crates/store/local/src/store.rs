use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use modreg_store::error::StoreError;
use modreg_store::store::BlobStore;

/// Configuration for the local filesystem store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root directory of the registry.
    pub path: PathBuf,
}

impl LocalConfig {
    /// Create a new `LocalConfig` rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// [`BlobStore`] over a directory tree.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at the configured directory.
    ///
    /// The directory does not need to exist yet; it is created by the first
    /// write.
    pub fn new(config: LocalConfig) -> Self {
        Self { root: config.path }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn ensure_parent(target: &Path) -> Result<(), StoreError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Walk `root/<dir of prefix>` and collect `/`-joined keys matching `prefix`.
fn scan(root: &Path, prefix: &str) -> Result<Vec<String>, StoreError> {
    // Only descend from the deepest directory named by the prefix.
    let base = prefix.rfind('/').map_or("", |idx| &prefix[..idx]);
    let start = root.join(base);
    if !start.is_dir() {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for entry in WalkDir::new(&start).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if key.starts_with(prefix) {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "local"
    }

    #[instrument(skip(self, data), fields(backend = "local", size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        let target = self.object_path(path);
        Self::ensure_parent(&target).await?;
        tokio::fs::write(&target, &data).await?;
        debug!(target = %target.display(), "object written");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn put_file(&self, path: &str, local: &Path) -> Result<(), StoreError> {
        let target = self.object_path(path);
        Self::ensure_parent(&target).await?;
        let copied = tokio::fs::copy(local, &target).await?;
        info!(target = %target.display(), size = copied, "file copied");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.object_path(path)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        match tokio::fs::metadata(self.object_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        let root = self.root.clone();
        let prefix = prefix.to_owned();
        stream::once(async move {
            let scanned = tokio::task::spawn_blocking(move || scan(&root, &prefix))
                .await
                .map_err(|e| StoreError::Backend(format!("directory scan failed: {e}")))
                .and_then(|result| result);
            match scanned {
                Ok(keys) => stream::iter(keys.into_iter().map(Ok)).boxed(),
                Err(e) => stream::iter([Err(e)]).boxed(),
            }
        })
        .flatten()
        .boxed()
    }

    fn source_url(&self, path: &str) -> String {
        let target = self.object_path(path);
        std::path::absolute(&target)
            .unwrap_or(target)
            .display()
            .to_string()
    }
}
