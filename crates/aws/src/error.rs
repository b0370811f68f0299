use modreg_store::StoreError;
use thiserror::Error;

/// Classified failures from the S3 API.
#[derive(Debug, Error)]
pub enum AwsStoreError {
    /// The service rejected the request.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// The request was throttled.
    #[error("AWS request throttled")]
    Throttled,

    /// Network or connection failure talking to AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// Credentials could not be resolved or were rejected.
    #[error("credential error: {0}")]
    CredentialError(String),
}

impl From<AwsStoreError> for StoreError {
    fn from(err: AwsStoreError) -> Self {
        match err {
            AwsStoreError::ServiceError(msg) => StoreError::Backend(msg),
            AwsStoreError::Throttled => StoreError::Throttled,
            AwsStoreError::Connection(msg) => StoreError::Connection(msg),
            AwsStoreError::Timeout => StoreError::Timeout,
            AwsStoreError::CredentialError(msg) => StoreError::Credential(msg),
        }
    }
}

/// Classify an AWS SDK error message into an [`AwsStoreError`].
///
/// Inspects the message for throttling, timeout, credential and connection
/// patterns; anything else is a service error.
pub fn classify_sdk_error(error_str: &str) -> AwsStoreError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl")
        || lower.contains("slowdown")
        || lower.contains("rate exceed")
        || lower.contains("too many")
    {
        AwsStoreError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsStoreError::Timeout
    } else if lower.contains("credential")
        || lower.contains("accessdenied")
        || lower.contains("access denied")
        || lower.contains("invalidaccesskeyid")
        || lower.contains("signaturedoesnotmatch")
    {
        AwsStoreError::CredentialError(error_str.to_owned())
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("dispatch failure")
    {
        AwsStoreError::Connection(error_str.to_owned())
    } else {
        AwsStoreError::ServiceError(error_str.to_owned())
    }
}
