use modreg_store::StoreError;
use thiserror::Error;

/// Errors specific to Cloud Storage operations.
#[derive(Debug, Error)]
pub enum GcpStoreError {
    /// The GCP service returned an error.
    #[error("GCP service error: {0}")]
    ServiceError(String),

    /// The request was throttled by the GCP service.
    #[error("GCP request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with GCP.
    #[error("GCP connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("GCP request timed out")]
    Timeout,

    /// GCP credential resolution failed.
    #[error("credential error: {0}")]
    CredentialError(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl From<GcpStoreError> for StoreError {
    fn from(err: GcpStoreError) -> Self {
        match err {
            GcpStoreError::ServiceError(msg) => StoreError::Backend(msg),
            GcpStoreError::Throttled => StoreError::Throttled,
            GcpStoreError::Connection(msg) => StoreError::Connection(msg),
            GcpStoreError::Timeout => StoreError::Timeout,
            GcpStoreError::CredentialError(msg) => StoreError::Credential(msg),
            GcpStoreError::Configuration(msg) => StoreError::Configuration(msg),
        }
    }
}

/// Classify a GCP error string into the appropriate [`GcpStoreError`].
///
/// Inspects the error message for common patterns (throttling, timeout,
/// permission, connection) and maps them to the correct variant.
pub fn classify_gcp_error(error_str: &str) -> GcpStoreError {
    let lower = error_str.to_lowercase();
    if lower.contains("429")
        || lower.contains("throttl")
        || lower.contains("rate exceed")
        || lower.contains("too many")
        || lower.contains("resource_exhausted")
    {
        GcpStoreError::Throttled
    } else if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("deadline_exceeded")
    {
        GcpStoreError::Timeout
    } else if lower.contains("permission_denied")
        || lower.contains("unauthenticated")
        || lower.contains("credential")
    {
        GcpStoreError::CredentialError(error_str.to_owned())
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("unavailable")
    {
        GcpStoreError::Connection(error_str.to_owned())
    } else {
        GcpStoreError::ServiceError(error_str.to_owned())
    }
}

/// Returns `true` if a GCP error message reports a missing object.
pub fn is_not_found_message(error_str: &str) -> bool {
    let lower = error_str.to_lowercase();
    lower.contains("not_found") || lower.contains("no such object") || lower.contains("404")
}
