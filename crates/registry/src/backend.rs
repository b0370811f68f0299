use std::collections::HashSet;
use std::path::Path;

use bytes::Bytes;
use futures::TryStreamExt;
use futures::future::try_join_all;
use tracing::{debug, info, instrument};

use modreg_core::{
    ModuleListItem, ModuleMeta, artifact_path, meta_path, now_millis, resolve_version,
};
use modreg_store::BlobStore;

use crate::error::RegistryError;

/// Module registry over one [`BlobStore`].
///
/// Owns the mapping from `(name, version label)` to physical paths. Every
/// key is `<prefix><name>/...`; the store never sees logical names.
#[derive(Debug)]
pub struct Registry<S> {
    store: S,
    prefix: String,
}

impl<S: BlobStore> Registry<S> {
    /// Create a registry rooted at the top of `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            prefix: String::new(),
        }
    }

    /// Root every key under `prefix`. The prefix is used verbatim, so a
    /// directory-style prefix needs its own trailing `/`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Configured key prefix (possibly empty).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Underlying blob store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Copy a local artifact to the path for `(name, label)`.
    ///
    /// Last write wins; callers wanting no-clobber check [`exists`](Self::exists) first.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn upload(&self, name: &str, label: &str, local: &Path) -> Result<(), RegistryError> {
        let path = artifact_path(&self.prefix, name, label);
        debug!(path = %path, "uploading artifact");
        self.store.put_file(&path, local).await?;
        Ok(())
    }

    /// Read a module's metadata, or the unsaved zero state if none exists.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn get_meta(&self, name: &str) -> Result<ModuleMeta, RegistryError> {
        match self.store.get(&meta_path(&self.prefix, name)).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.is_not_found() => {
                debug!("no metadata yet, using zero state");
                Ok(ModuleMeta::new(name, now_millis()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a module's metadata object.
    #[instrument(skip(self, meta), fields(backend = self.store.name(), name = %meta.name))]
    pub async fn save_meta(&self, meta: &ModuleMeta) -> Result<(), RegistryError> {
        let data = serde_json::to_vec(meta)?;
        self.store
            .put(&meta_path(&self.prefix, &meta.name), Bytes::from(data))
            .await?;
        info!(version = %meta.version, releases = meta.releases.len(), "metadata saved");
        Ok(())
    }

    /// With a label, whether that artifact exists; without, whether the
    /// module has metadata at all.
    pub async fn exists(&self, name: &str, label: Option<&str>) -> Result<bool, RegistryError> {
        let path = match label {
            Some(label) => artifact_path(&self.prefix, name, label),
            None => meta_path(&self.prefix, name),
        };
        Ok(self.store.exists(&path).await?)
    }

    /// Source URL of the artifact for `(name, label)`.
    ///
    /// Without a label the metadata's current version is used.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ModuleNotFound`] when the module has no published
    /// version or the artifact is missing.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn get_source_url(
        &self,
        name: &str,
        label: Option<&str>,
    ) -> Result<String, RegistryError> {
        let label = match label {
            Some(label) => label.to_owned(),
            None => {
                if !self.exists(name, None).await? {
                    return Err(RegistryError::not_found(name, None));
                }
                let meta = self.get_meta(name).await?;
                if !meta.is_published() {
                    return Err(RegistryError::not_found(name, None));
                }
                meta.version
            }
        };

        let path = artifact_path(&self.prefix, name, &label);
        if !self.store.exists(&path).await? {
            return Err(RegistryError::not_found(name, Some(&label)));
        }
        Ok(self.store.source_url(&path))
    }

    /// With a name, one entry per release of that module; without, every
    /// module name under the prefix.
    ///
    /// # Errors
    ///
    /// [`RegistryError::ModuleNotFound`] when `name` has no metadata.
    #[instrument(skip(self), fields(backend = self.store.name()))]
    pub async fn list(&self, name: Option<&str>) -> Result<Vec<ModuleListItem>, RegistryError> {
        if let Some(name) = name {
            if !self.exists(name, None).await? {
                return Err(RegistryError::not_found(name, None));
            }
            let meta = self.get_meta(name).await?;
            return Ok(meta
                .releases
                .into_iter()
                .map(|release| ModuleListItem::release(name, release.version))
                .collect());
        }

        let mut keys = self.store.list(&self.prefix);
        let mut seen = HashSet::new();
        let mut modules = Vec::new();
        while let Some(key) = keys.try_next().await? {
            let Some(rest) = key.strip_prefix(&self.prefix) else {
                continue;
            };
            let Some(module) = rest.split('/').next().filter(|s| !s.is_empty()) else {
                continue;
            };
            if seen.insert(module.to_owned()) {
                modules.push(ModuleListItem::module(module));
            }
        }
        debug!(count = modules.len(), "listed modules");
        Ok(modules)
    }

    /// Resolve `target` against the module's releases.
    ///
    /// Returns the concrete version and its source URL.
    pub async fn resolve(&self, name: &str, target: &str) -> Result<(String, String), RegistryError> {
        let meta = self.get_meta(name).await?;
        let version = resolve_version(&meta, target).map_err(|e| {
            debug!(error = %e, "version resolution failed");
            RegistryError::VersionResolution {
                name: name.to_owned(),
                target: target.to_owned(),
            }
        })?;
        let url = self.get_source_url(name, Some(&version)).await?;
        Ok((version, url))
    }

    /// Source URLs for several labels of one module, fetched concurrently.
    ///
    /// Reads only, so the fan-out is safe on every backend.
    pub async fn source_urls(
        &self,
        name: &str,
        labels: &[String],
    ) -> Result<Vec<(String, String)>, RegistryError> {
        try_join_all(labels.iter().map(|label| async move {
            let url = self.get_source_url(name, Some(label)).await?;
            Ok::<_, RegistryError>((label.clone(), url))
        }))
        .await
    }
}
