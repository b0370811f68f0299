use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use google_cloud_storage::client::{Storage, StorageControl};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use modreg_store::{BlobStore, ListPage, StoreError, paginate};

use crate::auth::build_gcp_credentials;
use crate::config::GcpBaseConfig;
use crate::error::{GcpStoreError, classify_gcp_error, is_not_found_message};

const DEFAULT_API_ENDPOINT: &str = "https://www.googleapis.com";

/// Configuration for the Cloud Storage blob store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shared GCP configuration.
    #[serde(flatten)]
    pub gcp: GcpBaseConfig,

    /// Bucket holding the registry.
    pub bucket: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("gcp", &self.gcp)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl StorageConfig {
    /// Create a new `StorageConfig` for `bucket` in `project_id`.
    pub fn new(project_id: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            gcp: GcpBaseConfig::new(project_id),
            bucket: bucket.into(),
        }
    }

    /// Set the endpoint URL override (for `fake-gcs-server`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.gcp.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the path to a service account JSON key file.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<String>) -> Self {
        self.gcp.credentials_path = Some(path.into());
        self
    }

    /// Set the inline service account JSON key.
    #[must_use]
    pub fn with_credentials_json(mut self, json: impl Into<String>) -> Self {
        self.gcp.credentials_json = Some(json.into());
        self
    }

    /// Bucket in the Cloud Storage v2 resource form.
    pub fn bucket_path(&self) -> String {
        format!("projects/_/buckets/{}", self.bucket)
    }

    /// Public locator for `object` in this bucket.
    pub fn object_url(&self, object: &str) -> String {
        let endpoint = self
            .gcp
            .endpoint_url
            .as_deref()
            .unwrap_or(DEFAULT_API_ENDPOINT)
            .trim_end_matches('/');
        format!("gcs::{endpoint}/storage/v1/{}/{object}", self.bucket)
    }
}

/// [`BlobStore`] over a single Cloud Storage bucket.
pub struct GcsBlobStore {
    config: StorageConfig,
    storage: Storage,
    control: StorageControl,
}

impl std::fmt::Debug for GcsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsBlobStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GcsBlobStore {
    /// Create a new `GcsBlobStore` by building Cloud Storage clients.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credential`] if the service account key is
    /// unusable, or [`StoreError::Configuration`] if a client cannot be built.
    pub async fn new(config: StorageConfig) -> Result<Self, StoreError> {
        let credentials = build_gcp_credentials(&config.gcp).await?;

        // Object reads and writes.
        let mut storage_builder = Storage::builder();
        if let Some(ref endpoint) = config.gcp.endpoint_url {
            storage_builder = storage_builder.with_endpoint(endpoint);
        }
        if let Some(ref creds) = credentials {
            storage_builder = storage_builder.with_credentials(creds.clone());
        }
        let storage = storage_builder.build().await.map_err(|e| {
            GcpStoreError::Configuration(format!("Cloud Storage client error: {e}"))
        })?;

        // Metadata and listing.
        let mut control_builder = StorageControl::builder();
        if let Some(ref endpoint) = config.gcp.endpoint_url {
            control_builder = control_builder.with_endpoint(endpoint);
        }
        if let Some(ref creds) = credentials {
            control_builder = control_builder.with_credentials(creds.clone());
        }
        let control = control_builder.build().await.map_err(|e| {
            GcpStoreError::Configuration(format!("Cloud Storage control client error: {e}"))
        })?;

        Ok(Self {
            config,
            storage,
            control,
        })
    }

    /// Configuration this store was built from.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

fn gcp_error(err: &google_cloud_storage::Error) -> StoreError {
    let err_str = err.to_string();
    error!(error = %err_str, "Cloud Storage request failed");
    classify_gcp_error(&err_str).into()
}

fn is_not_found(err: &google_cloud_storage::Error) -> bool {
    err.http_status_code() == Some(404) || is_not_found_message(&err.to_string())
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "gcs"
    }

    #[instrument(skip(self, data), fields(backend = "gcs", bucket = %self.config.bucket, size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        let write_request = self
            .storage
            .write_object(self.config.bucket_path(), path, data);
        Box::pin(write_request.send_buffered())
            .await
            .map_err(|e| gcp_error(&e))?;
        info!("object uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "gcs", bucket = %self.config.bucket))]
    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        let mut response = match self
            .storage
            .read_object(self.config.bucket_path(), path)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Err(StoreError::NotFound(path.to_owned())),
            Err(e) => return Err(gcp_error(&e)),
        };

        let mut body = Vec::new();
        while let Some(chunk) = response.next().await {
            let chunk = chunk.map_err(|e| {
                StoreError::Connection(format!("failed to read object body: {e}"))
            })?;
            body.extend_from_slice(&chunk);
        }
        debug!(size = body.len(), "object downloaded");
        Ok(Bytes::from(body))
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        match self
            .control
            .get_object()
            .set_bucket(self.config.bucket_path())
            .set_object(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(gcp_error(&e)),
        }
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        let control = &self.control;
        let parent = self.config.bucket_path();
        let prefix = prefix.to_owned();
        paginate(move |token: Option<String>| {
            let request = control
                .list_objects()
                .set_parent(parent.clone())
                .set_prefix(prefix.clone())
                .set_page_token(token.unwrap_or_default());
            async move {
                let response = request.send().await.map_err(|e| gcp_error(&e))?;
                let keys = response.objects.into_iter().map(|object| object.name).collect();
                Ok(ListPage {
                    keys,
                    next_token: Some(response.next_page_token),
                })
            }
        })
    }

    fn source_url(&self, path: &str) -> String {
        self.config.object_url(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new() {
        let config = StorageConfig::new("my-project", "modules");
        assert_eq!(config.gcp.project_id, "my-project");
        assert_eq!(config.bucket, "modules");
    }

    #[test]
    fn config_builder_chain() {
        let config = StorageConfig::new("test-project", "modules")
            .with_endpoint_url("http://localhost:4443")
            .with_credentials_path("/path/to/sa.json");
        assert_eq!(
            config.gcp.endpoint_url.as_deref(),
            Some("http://localhost:4443")
        );
        assert_eq!(
            config.gcp.credentials_path.as_deref(),
            Some("/path/to/sa.json")
        );
    }

    #[test]
    fn config_serde_flattens_gcp() {
        let json = r#"{"project_id":"p","bucket":"modules","credentials_path":"/sa.json"}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.gcp.project_id, "p");
        assert_eq!(config.bucket, "modules");
        assert_eq!(config.gcp.credentials_path.as_deref(), Some("/sa.json"));
    }

    #[test]
    fn bucket_path_format() {
        let config = StorageConfig::new("p", "my-bucket");
        assert_eq!(config.bucket_path(), "projects/_/buckets/my-bucket");
    }

    #[test]
    fn object_url_default_endpoint() {
        let config = StorageConfig::new("p", "modules");
        assert_eq!(
            config.object_url("vpc/1.0.0/module.zip"),
            "gcs::https://www.googleapis.com/storage/v1/modules/vpc/1.0.0/module.zip"
        );
    }

    #[test]
    fn object_url_with_override() {
        let config = StorageConfig::new("p", "modules").with_endpoint_url("http://localhost:4443/");
        assert_eq!(
            config.object_url("vpc/latest/module.zip"),
            "gcs::http://localhost:4443/storage/v1/modules/vpc/latest/module.zip"
        );
    }
}
