use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use modreg_core::{
    LATEST, ModuleMeta, expand_version, now_millis, validate_module_name, validate_version_label,
};
use modreg_store::BlobStore;

use crate::archive::Archiver;
use crate::backend::Registry;
use crate::error::RegistryError;

/// Knobs shared by [`publish`] and [`publish_artifact`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Replace an existing release instead of failing.
    pub overwrite: bool,
    /// Stop after the conflict check and report the planned labels.
    pub dry_run: bool,
}

/// A request to archive a directory and publish it as `name@version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub name: String,
    pub version: String,
    pub source_dir: PathBuf,
    pub overwrite: bool,
    pub dry_run: bool,
}

impl PublishRequest {
    /// Create a request with overwrite and dry run disabled.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source_dir: source_dir.into(),
            overwrite: false,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The overwrite/dry-run flags of this request.
    pub fn options(&self) -> PublishOptions {
        PublishOptions {
            overwrite: self.overwrite,
            dry_run: self.dry_run,
        }
    }
}

/// Result of a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub name: String,
    pub version: String,
    /// Every label the artifact was (or, in a dry run, would be) uploaded under.
    pub labels: Vec<String>,
    /// Metadata after the publish; unchanged current metadata in a dry run.
    pub meta: ModuleMeta,
    pub dry_run: bool,
}

/// Labels a release of `version` is stored under: `latest`, then the
/// expanded aliases.
pub fn upload_labels(version: &str) -> Vec<String> {
    std::iter::once(LATEST.to_owned())
        .chain(expand_version(version))
        .collect()
}

/// Archive `request.source_dir` and publish it.
///
/// Archiving runs on the blocking pool. The archive is a temporary file
/// removed on every exit path.
///
/// # Errors
///
/// [`RegistryError::InvalidModuleName`] or [`RegistryError::Config`] for a
/// bad name or version label, [`RegistryError::Archive`] if archiving fails,
/// plus everything [`publish_artifact`] returns.
#[instrument(skip(registry, archiver, request), fields(name = %request.name, version = %request.version))]
pub async fn publish<S, A>(
    registry: &Registry<S>,
    archiver: &A,
    request: &PublishRequest,
) -> Result<PublishOutcome, RegistryError>
where
    S: BlobStore,
    A: Archiver + Clone + 'static,
{
    validate_module_name(&request.name).map_err(RegistryError::InvalidModuleName)?;
    validate_version_label(&request.version).map_err(RegistryError::Config)?;

    let archiver = archiver.clone();
    let source_dir = request.source_dir.clone();
    let archive = tokio::task::spawn_blocking(move || archiver.archive(&source_dir))
        .await
        .map_err(|e| RegistryError::Archive(format!("archive task failed: {e}")))??;
    debug!(archive = %archive.display(), "archive ready");
    publish_artifact(
        registry,
        &request.name,
        &request.version,
        &archive,
        request.options(),
    )
    .await
}

/// Publish an already-built archive as `name@version`.
///
/// Uploads run one label at a time. A failure part-way leaves earlier labels
/// written; re-publishing with overwrite repairs them.
///
/// # Errors
///
/// [`RegistryError::Config`] if `version` is not a valid label,
/// [`RegistryError::ModuleAlreadyExists`] if the version exists and
/// `options.overwrite` is off; store and serialization failures otherwise.
#[instrument(skip(registry, artifact), fields(backend = registry.store().name()))]
pub async fn publish_artifact<S: BlobStore>(
    registry: &Registry<S>,
    name: &str,
    version: &str,
    artifact: &Path,
    options: PublishOptions,
) -> Result<PublishOutcome, RegistryError> {
    validate_version_label(version).map_err(RegistryError::Config)?;
    let exists = registry.exists(name, Some(version)).await?;
    if exists && !options.overwrite {
        return Err(RegistryError::ModuleAlreadyExists {
            name: name.to_owned(),
            version: Some(version.to_owned()),
        });
    }

    let labels = upload_labels(version);

    if options.dry_run {
        info!(labels = ?labels, "dry run, nothing uploaded");
        let meta = registry.get_meta(name).await?;
        return Ok(PublishOutcome {
            name: name.to_owned(),
            version: version.to_owned(),
            labels,
            meta,
            dry_run: true,
        });
    }

    if exists {
        warn!("overwriting existing release");
    }

    for label in &labels {
        registry.upload(name, label, artifact).await?;
    }

    let meta = registry
        .get_meta(name)
        .await?
        .record_release(version, now_millis());
    registry.save_meta(&meta).await?;

    info!(labels = labels.len(), "module published");
    Ok(PublishOutcome {
        name: name.to_owned(),
        version: version.to_owned(),
        labels,
        meta,
        dry_run: false,
    })
}
