use serde::{Deserialize, Serialize};

/// Shared Azure connection settings.
///
/// Service principal credentials are optional; without them the Azure CLI
/// login context is used. The endpoint override targets local emulators
/// such as `Azurite`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureBaseConfig {
    /// Azure AD tenant ID.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Azure AD application (client) ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Azure AD client credential (service principal). Redacted in `Debug`.
    #[serde(default)]
    pub client_credential: Option<String>,

    /// Optional blob service URL override (e.g. `Azurite`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AzureBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBaseConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AzureBaseConfig {
    /// Create an empty `AzureBaseConfig` that authenticates through the CLI.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Azure AD tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the Azure AD application (client) ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the Azure AD client credential.
    #[must_use]
    pub fn with_client_credential(mut self, client_credential: impl Into<String>) -> Self {
        self.client_credential = Some(client_credential.into());
        self
    }

    /// Set the endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Returns `true` when all three service principal fields are set.
    pub fn has_service_principal(&self) -> bool {
        self.tenant_id.is_some() && self.client_id.is_some() && self.client_credential.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_empty() {
        let config = AzureBaseConfig::new();
        assert!(config.tenant_id.is_none());
        assert!(config.client_id.is_none());
        assert!(config.endpoint_url.is_none());
        assert!(!config.has_service_principal());
    }

    #[test]
    fn builder_chain() {
        let config = AzureBaseConfig::new()
            .with_tenant_id("tid-123")
            .with_client_id("cid-456")
            .with_client_credential("cred-789")
            .with_endpoint_url("http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(config.tenant_id.as_deref(), Some("tid-123"));
        assert_eq!(config.client_id.as_deref(), Some("cid-456"));
        assert_eq!(config.client_credential.as_deref(), Some("cred-789"));
        assert!(config.has_service_principal());
    }

    #[test]
    fn partial_service_principal() {
        let config = AzureBaseConfig::new()
            .with_tenant_id("tid")
            .with_client_id("cid");
        assert!(!config.has_service_principal());
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = AzureBaseConfig::new()
            .with_client_id("my-app-id")
            .with_client_credential("super-private");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("my-app-id"));
        assert!(!debug.contains("super-private"));
    }

    #[test]
    fn serde_roundtrip() {
        let config = AzureBaseConfig::new()
            .with_tenant_id("tid-round")
            .with_endpoint_url("http://azurite:10000");
        let json = serde_json::to_string(&config).unwrap();
        let back: AzureBaseConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
