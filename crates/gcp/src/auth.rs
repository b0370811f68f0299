use google_cloud_auth::credentials::{self, Credentials};
use tracing::info;

use crate::config::GcpBaseConfig;
use crate::error::GcpStoreError;

/// Build GCP credentials from the configured service account key.
///
/// Inline JSON wins over a key file path. With neither set this returns
/// `None` and the client falls back to Application Default Credentials.
///
/// # Errors
///
/// Returns [`GcpStoreError::CredentialError`] if the key cannot be read or
/// is not a valid service account key.
pub async fn build_gcp_credentials(
    config: &GcpBaseConfig,
) -> Result<Option<Credentials>, GcpStoreError> {
    let content = if let Some(json) = &config.credentials_json {
        info!("loading GCP credentials from inline JSON");
        json.clone()
    } else if let Some(path) = &config.credentials_path {
        info!("loading GCP credentials from service account file");
        tokio::fs::read_to_string(path).await.map_err(|e| {
            GcpStoreError::CredentialError(format!(
                "failed to read credentials file '{path}': {e}"
            ))
        })?
    } else {
        info!("using Application Default Credentials (ADC) for GCP");
        return Ok(None);
    };

    let key_value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| GcpStoreError::CredentialError(format!("invalid credentials JSON: {e}")))?;

    let creds = credentials::service_account::Builder::new(key_value)
        .build()
        .map_err(|e| {
            GcpStoreError::CredentialError(format!(
                "failed to build service account credentials: {e}"
            ))
        })?;

    Ok(Some(creds))
}
