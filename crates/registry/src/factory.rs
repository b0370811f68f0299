use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "s3")]
use modreg_aws::{S3BlobStore, S3Config};
#[cfg(feature = "azure")]
use modreg_azure::{AzureBlobStore, BlobConfig};
#[cfg(feature = "gcp")]
use modreg_gcp::{GcsBlobStore, StorageConfig};
use modreg_store::{BlobStore, StoreError};
use modreg_store_local::{LocalBlobStore, LocalConfig};
use modreg_store_memory::MemoryBlobStore;

use crate::backend::Registry;
use crate::error::RegistryError;

/// S3 backend settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Backend {
    pub bucket: String,
    pub region: String,
    #[serde(default, alias = "key_prefix", alias = "keyPrefix")]
    pub prefix: Option<String>,
    #[serde(default, alias = "endpointUrl")]
    pub endpoint_url: Option<String>,
    #[serde(default, alias = "roleArn")]
    pub role_arn: Option<String>,
    /// STS session name used with `role_arn`.
    #[serde(default, alias = "sessionName")]
    pub session_name: Option<String>,
    /// STS external ID used with `role_arn`.
    #[serde(default, alias = "externalId")]
    pub external_id: Option<String>,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("prefix", &self.prefix)
            .field("endpoint_url", &self.endpoint_url)
            .field("role_arn", &self.role_arn)
            .field("session_name", &self.session_name)
            .field(
                "external_id",
                &self.external_id.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(feature = "s3")]
impl S3Backend {
    fn store_config(&self) -> S3Config {
        let mut config = S3Config::new(&self.region, &self.bucket);
        if let Some(endpoint) = &self.endpoint_url {
            config = config.with_endpoint_url(endpoint);
        }
        if let Some(role_arn) = &self.role_arn {
            config = config.with_role_arn(role_arn);
        }
        if let Some(session_name) = &self.session_name {
            config = config.with_session_name(session_name);
        }
        if let Some(external_id) = &self.external_id {
            config = config.with_external_id(external_id);
        }
        config
    }
}

/// Cloud Storage backend settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpBackend {
    pub bucket: String,
    #[serde(alias = "projectId")]
    pub project_id: String,
    #[serde(default, alias = "path_prefix", alias = "pathPrefix")]
    pub prefix: Option<String>,
    #[serde(default, alias = "apiEndpoint")]
    pub endpoint_url: Option<String>,
    #[serde(default, alias = "credentialsPath")]
    pub credentials_path: Option<String>,
    /// Inline service account key. Takes precedence over `credentials_path`.
    #[serde(default, alias = "credentialsJson")]
    pub credentials_json: Option<String>,
}

impl std::fmt::Debug for GcpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpBackend")
            .field("bucket", &self.bucket)
            .field("project_id", &self.project_id)
            .field("prefix", &self.prefix)
            .field("endpoint_url", &self.endpoint_url)
            .field("credentials_path", &self.credentials_path)
            .field(
                "credentials_json",
                &self.credentials_json.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpBackend {
    fn store_config(&self) -> StorageConfig {
        let mut config = StorageConfig::new(&self.project_id, &self.bucket);
        if let Some(endpoint) = &self.endpoint_url {
            config = config.with_endpoint_url(endpoint);
        }
        if let Some(path) = &self.credentials_path {
            config = config.with_credentials_path(path);
        }
        if let Some(json) = &self.credentials_json {
            config = config.with_credentials_json(json);
        }
        config
    }
}

/// Azure Blob Storage backend settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureBackend {
    pub account: String,
    pub container: String,
    #[serde(default, alias = "file_name_prefix", alias = "fileNamePrefix")]
    pub prefix: Option<String>,
    #[serde(default, alias = "serviceUrl")]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_credential: Option<String>,
}

impl std::fmt::Debug for AzureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBackend")
            .field("account", &self.account)
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("endpoint_url", &self.endpoint_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Local directory backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBackend {
    pub path: PathBuf,
}

/// Which physical store backs the registry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    S3(S3Backend),
    Gcp(GcpBackend),
    Azure(AzureBackend),
    Local(LocalBackend),
    /// In-process store. Nothing survives the process.
    Memory,
}

impl BackendConfig {
    /// The `type` tag of this backend.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::Gcp(_) => "gcp",
            Self::Azure(_) => "azure",
            Self::Local(_) => "local",
            Self::Memory => "memory",
        }
    }

    /// Key prefix configured for this backend (empty when unset).
    pub fn prefix(&self) -> &str {
        let prefix = match self {
            Self::S3(c) => c.prefix.as_deref(),
            Self::Gcp(c) => c.prefix.as_deref(),
            Self::Azure(c) => c.prefix.as_deref(),
            Self::Local(_) | Self::Memory => None,
        };
        prefix.unwrap_or_default()
    }

    /// Resolve relative local paths against `base`.
    #[must_use]
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::Local(LocalBackend { path }) if path.is_relative() => Self::Local(LocalBackend {
                path: base.join(path),
            }),
            other => other,
        }
    }
}

/// The compiled-in blob stores, dispatched statically.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryBlobStore),
    Local(LocalBlobStore),
    #[cfg(feature = "s3")]
    S3(S3BlobStore),
    #[cfg(feature = "azure")]
    Azure(AzureBlobStore),
    #[cfg(feature = "gcp")]
    Gcs(GcsBlobStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $body:expr) => {
        match $self {
            AnyStore::Memory($store) => $body,
            AnyStore::Local($store) => $body,
            #[cfg(feature = "s3")]
            AnyStore::S3($store) => $body,
            #[cfg(feature = "azure")]
            AnyStore::Azure($store) => $body,
            #[cfg(feature = "gcp")]
            AnyStore::Gcs($store) => $body,
        }
    };
}

#[async_trait]
impl BlobStore for AnyStore {
    fn name(&self) -> &str {
        dispatch!(self, s => s.name())
    }

    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        dispatch!(self, s => s.put(path, data).await)
    }

    async fn put_file(&self, path: &str, local: &Path) -> Result<(), StoreError> {
        dispatch!(self, s => s.put_file(path, local).await)
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        dispatch!(self, s => s.get(path).await)
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        dispatch!(self, s => s.exists(path).await)
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        dispatch!(self, s => s.list(prefix))
    }

    fn source_url(&self, path: &str) -> String {
        dispatch!(self, s => s.source_url(path))
    }
}

#[cfg(not(all(feature = "s3", feature = "azure", feature = "gcp")))]
fn feature_disabled(kind: &str) -> RegistryError {
    RegistryError::Config(format!(
        "backend '{kind}' is not compiled in (is the feature enabled?)"
    ))
}

/// Build the store described by `config`.
///
/// # Errors
///
/// [`RegistryError::Config`] if the backend's feature is disabled;
/// [`RegistryError::Store`] if the client cannot be constructed.
#[allow(clippy::unused_async)]
pub async fn build_store(config: &BackendConfig) -> Result<AnyStore, RegistryError> {
    let store = match config {
        BackendConfig::Memory => AnyStore::Memory(MemoryBlobStore::new()),
        BackendConfig::Local(local) => {
            AnyStore::Local(LocalBlobStore::new(LocalConfig::new(&local.path)))
        }
        #[cfg(feature = "s3")]
        BackendConfig::S3(s3) => AnyStore::S3(S3BlobStore::new(s3.store_config()).await),
        #[cfg(feature = "azure")]
        BackendConfig::Azure(azure) => {
            let mut blob_config = BlobConfig::new(&azure.account, &azure.container);
            if let Some(endpoint) = &azure.endpoint_url {
                blob_config = blob_config.with_endpoint_url(endpoint);
            }
            if let Some(tenant_id) = &azure.tenant_id {
                blob_config = blob_config.with_tenant_id(tenant_id);
            }
            if let Some(client_id) = &azure.client_id {
                blob_config = blob_config.with_client_id(client_id);
            }
            if let Some(credential) = &azure.client_credential {
                blob_config = blob_config.with_client_credential(credential);
            }
            AnyStore::Azure(AzureBlobStore::new(blob_config)?)
        }
        #[cfg(feature = "gcp")]
        BackendConfig::Gcp(gcp) => AnyStore::Gcs(GcsBlobStore::new(gcp.store_config()).await?),
        #[cfg(not(all(feature = "s3", feature = "azure", feature = "gcp")))]
        other => return Err(feature_disabled(other.kind())),
    };
    Ok(store)
}

/// Build a registry for `config`, rooted at its prefix.
///
/// # Errors
///
/// See [`build_store`].
pub async fn build_registry(config: &BackendConfig) -> Result<Registry<AnyStore>, RegistryError> {
    let store = build_store(config).await?;
    info!(backend = config.kind(), prefix = config.prefix(), "registry backend ready");
    Ok(Registry::new(store).with_prefix(config.prefix()))
}
