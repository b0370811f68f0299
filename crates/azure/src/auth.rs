use std::sync::Arc;

use azure_core::credentials::{Secret, TokenCredential};
use tracing::{debug, info};

use crate::config::AzureBaseConfig;
use crate::error::AzureStoreError;

/// Build an Azure credential from the given [`AzureBaseConfig`].
///
/// With `tenant_id`, `client_id` and `client_credential` all present this is
/// a `ClientSecretCredential`; otherwise it falls back to
/// `AzureCliCredential`, which uses the local `az login` context.
///
/// # Errors
///
/// Returns [`AzureStoreError::CredentialError`] if credential construction fails.
pub fn build_azure_credential(
    config: &AzureBaseConfig,
) -> Result<Arc<dyn TokenCredential>, AzureStoreError> {
    if let (Some(tenant_id), Some(client_id), Some(client_cred)) = (
        &config.tenant_id,
        &config.client_id,
        &config.client_credential,
    ) {
        info!("using service-principal credentials for Azure");
        debug!(tenant_id = %tenant_id, "building ClientSecretCredential");

        let credential = azure_identity::ClientSecretCredential::new(
            tenant_id,
            client_id.clone(),
            Secret::new(client_cred.clone()),
            None,
        )
        .map_err(|e| AzureStoreError::CredentialError(e.to_string()))?;

        Ok(credential)
    } else {
        info!("using AzureCliCredential for Azure");
        let credential = azure_identity::AzureCliCredential::new(None)
            .map_err(|e| AzureStoreError::CredentialError(e.to_string()))?;

        Ok(credential)
    }
}
