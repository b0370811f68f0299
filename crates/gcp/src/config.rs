use serde::{Deserialize, Serialize};

/// Shared GCP connection settings.
///
/// Service account key (as a file path or inline JSON), project ID, and an
/// endpoint override for local emulators.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcpBaseConfig {
    /// GCP project ID.
    pub project_id: String,

    /// Path to a service account JSON key file.
    /// If not set, Application Default Credentials (ADC) are used.
    #[serde(default)]
    pub credentials_path: Option<String>,

    /// Inline service account JSON key. Takes precedence over the path.
    #[serde(default)]
    pub credentials_json: Option<String>,

    /// Optional endpoint URL override (e.g. `fake-gcs-server`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for GcpBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpBaseConfig")
            .field("project_id", &self.project_id)
            .field(
                "credentials_path",
                &self.credentials_path.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "credentials_json",
                &self.credentials_json.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl GcpBaseConfig {
    /// Create a new `GcpBaseConfig` with the given project ID.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            credentials_path: None,
            credentials_json: None,
            endpoint_url: None,
        }
    }

    /// Set the path to a service account JSON key file.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<String>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Set the inline service account JSON key.
    #[must_use]
    pub fn with_credentials_json(mut self, json: impl Into<String>) -> Self {
        self.credentials_json = Some(json.into());
        self
    }

    /// Set the endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}
