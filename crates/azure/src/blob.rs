use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_core::http::StatusCode;
use azure_storage_blob::BlobServiceClient;
use azure_storage_blob::models::{BlobContainerClientListBlobsOptions, ListBlobsFlatSegmentResponse};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use modreg_store::{BlobStore, StoreError};

use crate::auth::build_azure_credential;
use crate::config::AzureBaseConfig;
use crate::error::{AzureStoreError, classify_azure_error};

/// Configuration for the Azure Blob Storage store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Shared Azure configuration.
    #[serde(flatten)]
    pub azure: AzureBaseConfig,

    /// Azure Storage account name.
    pub account: String,

    /// Container holding the registry.
    pub container: String,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("azure", &self.azure)
            .field("account", &self.account)
            .field("container", &self.container)
            .finish()
    }
}

impl BlobConfig {
    /// Create a new `BlobConfig` for `container` in storage `account`.
    pub fn new(account: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            azure: AzureBaseConfig::new(),
            account: account.into(),
            container: container.into(),
        }
    }

    /// Set the endpoint URL override (for `Azurite`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.azure.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the Azure AD tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.azure.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the Azure AD client ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.azure.client_id = Some(client_id.into());
        self
    }

    /// Set the Azure AD client credential.
    #[must_use]
    pub fn with_client_credential(mut self, client_credential: impl Into<String>) -> Self {
        self.azure.client_credential = Some(client_credential.into());
        self
    }

    /// Blob service URL: the override if set, else the account's public endpoint.
    pub fn service_url(&self) -> String {
        match &self.azure.endpoint_url {
            Some(endpoint) => endpoint.trim_end_matches('/').to_owned(),
            None => format!("https://{}.blob.core.windows.net", self.account),
        }
    }

    /// Public locator for `blob` in this container.
    pub fn blob_url(&self, blob: &str) -> String {
        format!("{}/{}/{blob}", self.service_url(), self.container)
    }
}

/// [`BlobStore`] over a single Azure Blob Storage container.
pub struct AzureBlobStore {
    config: BlobConfig,
    service_client: BlobServiceClient,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// Create a new `AzureBlobStore` by building an Azure Blob Storage client.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credential`] if no credential can be built, or
    /// [`StoreError::Configuration`] if the service URL is rejected.
    pub fn new(config: BlobConfig) -> Result<Self, StoreError> {
        let credential = build_azure_credential(&config.azure)?;
        Self::with_credential(config, credential)
    }

    /// Create an `AzureBlobStore` with a pre-built credential.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the service URL is rejected.
    pub fn with_credential(
        config: BlobConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, StoreError> {
        let endpoint = config.service_url();
        let service_client = BlobServiceClient::new(&endpoint, Some(credential), None)
            .map_err(|e| AzureStoreError::Configuration(format!("blob client error: {e}")))?;
        debug!(endpoint = %endpoint, container = %config.container, "Azure blob client ready");
        Ok(Self {
            config,
            service_client,
        })
    }

    /// Configuration this store was built from.
    pub fn config(&self) -> &BlobConfig {
        &self.config
    }
}

fn is_not_found(err: &azure_core::Error) -> bool {
    err.http_status() == Some(StatusCode::NotFound)
}

fn azure_error(err: &azure_core::Error) -> StoreError {
    let err_str = err.to_string();
    error!(error = %err_str, "Azure blob request failed");
    classify_azure_error(&err_str).into()
}

fn list_options(prefix: &str) -> BlobContainerClientListBlobsOptions<'static> {
    BlobContainerClientListBlobsOptions {
        prefix: Some(prefix.to_owned()),
        ..Default::default()
    }
}

/// Blob names in one listing page. Items without a name are skipped.
fn page_names(page: ListBlobsFlatSegmentResponse) -> Vec<String> {
    page.segment
        .blob_items
        .into_iter()
        .filter_map(|item| item.name.and_then(|name| name.content))
        .collect()
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "azure"
    }

    #[instrument(skip(self, data), fields(backend = "azure", container = %self.config.container, size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        let content_length = data.len() as u64;
        let blob_client = self.service_client.blob_client(&self.config.container, path);
        blob_client
            .upload(data.into(), true, content_length, None)
            .await
            .map_err(|e| azure_error(&e))?;
        info!("blob uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "azure", container = %self.config.container))]
    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        let blob_client = self.service_client.blob_client(&self.config.container, path);
        let response = match blob_client.download(None).await {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Err(StoreError::NotFound(path.to_owned())),
            Err(e) => return Err(azure_error(&e)),
        };

        let body: Bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Connection(format!("failed to read blob body: {e}")))?;
        debug!(size = body.len(), "blob downloaded");
        Ok(body)
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let blob_client = self.service_client.blob_client(&self.config.container, path);
        match blob_client.get_properties(None).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(azure_error(&e)),
        }
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        let container = self
            .service_client
            .blob_container_client(&self.config.container);
        match container.list_blobs(Some(list_options(prefix))) {
            Ok(pager) => pager
                .into_pages()
                .map(|page| {
                    let page = page
                        .and_then(|response| response.into_model())
                        .map_err(|e| azure_error(&e))?;
                    let names = page_names(page).into_iter().map(Ok::<_, StoreError>);
                    Ok::<_, StoreError>(stream::iter(names))
                })
                .try_flatten()
                .boxed(),
            Err(e) => stream::iter([Err(azure_error(&e))]).boxed(),
        }
    }

    fn source_url(&self, path: &str) -> String {
        self.config.blob_url(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new() {
        let config = BlobConfig::new("modstore", "modules");
        assert_eq!(config.account, "modstore");
        assert_eq!(config.container, "modules");
        assert!(config.azure.endpoint_url.is_none());
    }

    #[test]
    fn config_builder_chain() {
        let config = BlobConfig::new("teststorage", "data")
            .with_endpoint_url("http://127.0.0.1:10000/devstoreaccount1")
            .with_tenant_id("tid-123")
            .with_client_id("cid-456")
            .with_client_credential("cred-789");
        assert_eq!(
            config.azure.endpoint_url.as_deref(),
            Some("http://127.0.0.1:10000/devstoreaccount1")
        );
        assert!(config.azure.has_service_principal());
    }

    #[test]
    fn config_debug_redacts() {
        let config = BlobConfig::new("modstore", "modules").with_client_credential("private-val");
        let debug = format!("{config:?}");
        assert!(debug.contains("BlobConfig"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("modstore"));
        assert!(!debug.contains("private-val"));
    }

    #[test]
    fn config_serde_flattens_azure() {
        let json = r#"{"account":"archive","container":"backups","tenant_id":"tid"}"#;
        let config: BlobConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.account, "archive");
        assert_eq!(config.container, "backups");
        assert_eq!(config.azure.tenant_id.as_deref(), Some("tid"));
    }

    #[test]
    fn list_options_carry_prefix() {
        let options = list_options("tf/vpc/");
        assert_eq!(options.prefix.as_deref(), Some("tf/vpc/"));
    }

    #[test]
    fn page_names_skip_unnamed_items() {
        use azure_storage_blob::models::{BlobItem, BlobName};

        let named = |name: &str| {
            let mut blob_name = BlobName::default();
            blob_name.content = Some(name.to_owned());
            let mut item = BlobItem::default();
            item.name = Some(blob_name);
            item
        };
        let mut page = ListBlobsFlatSegmentResponse::default();
        page.segment.blob_items = vec![
            named("vpc/meta.json"),
            BlobItem::default(),
            named("vpc/1.0.0/module.zip"),
        ];
        assert_eq!(page_names(page), ["vpc/meta.json", "vpc/1.0.0/module.zip"]);
    }

    #[test]
    fn blob_url_uses_account_endpoint() {
        let config = BlobConfig::new("modstore", "modules");
        assert_eq!(
            config.blob_url("vpc/1.0.0/module.zip"),
            "https://modstore.blob.core.windows.net/modules/vpc/1.0.0/module.zip"
        );
    }

    #[test]
    fn blob_url_uses_override() {
        let config = BlobConfig::new("devstoreaccount1", "modules")
            .with_endpoint_url("http://127.0.0.1:10000/devstoreaccount1/");
        assert_eq!(
            config.blob_url("vpc/latest/module.zip"),
            "http://127.0.0.1:10000/devstoreaccount1/modules/vpc/latest/module.zip"
        );
    }
}
