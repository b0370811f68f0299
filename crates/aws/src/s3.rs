use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use modreg_store::{BlobStore, ListPage, StoreError, paginate};

use crate::auth::build_sdk_config;
use crate::config::AwsBaseConfig;
use crate::error::classify_sdk_error;

/// Configuration for the S3 blob store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Config {
    /// Shared AWS configuration (region, role ARN, endpoint URL).
    #[serde(flatten)]
    pub aws: AwsBaseConfig,

    /// Bucket holding the registry.
    pub bucket: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("aws", &self.aws)
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl S3Config {
    /// Create a new `S3Config` for `bucket` in `region`.
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            aws: AwsBaseConfig::new(region),
            bucket: bucket.into(),
        }
    }

    /// Set the endpoint URL override (for `LocalStack` or `MinIO`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.aws.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the IAM role ARN to assume.
    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.aws.role_arn = Some(role_arn.into());
        self
    }

    /// Set the STS session name for assume-role.
    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.aws.session_name = Some(session_name.into());
        self
    }

    /// Set the external ID for cross-account trust policies.
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.aws.external_id = Some(external_id.into());
        self
    }

    /// Public locator for `key` in this bucket.
    ///
    /// Uses the regional virtual endpoint unless an endpoint override is
    /// configured, in which case the override is used path-style.
    pub fn object_url(&self, key: &str) -> String {
        match &self.aws.endpoint_url {
            Some(endpoint) => format!(
                "s3::{}/{}/{key}",
                endpoint.trim_end_matches('/'),
                self.bucket
            ),
            None => format!(
                "s3::https://s3-{}.amazonaws.com/{}/{key}",
                self.aws.region, self.bucket
            ),
        }
    }
}

/// [`BlobStore`] over a single S3 bucket.
pub struct S3BlobStore {
    config: S3Config,
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3BlobStore")
            .field("config", &self.config)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3BlobStore {
    /// Create a new `S3BlobStore` by building an AWS SDK client.
    ///
    /// Endpoint overrides switch the client to path-style addressing.
    pub async fn new(config: S3Config) -> Self {
        let sdk_config = build_sdk_config(&config.aws).await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.aws.endpoint_url.is_some())
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_config);
        Self { config, client }
    }

    /// Create an `S3BlobStore` with a pre-built client (for testing).
    pub fn with_client(config: S3Config, client: aws_sdk_s3::Client) -> Self {
        Self { config, client }
    }

    /// Configuration this store was built from.
    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

fn sdk_error<E>(err: E) -> StoreError
where
    E: std::error::Error,
{
    classify_sdk_error(&DisplayErrorContext(err).to_string()).into()
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "s3"
    }

    #[instrument(skip(self, data), fields(backend = "s3", bucket = %self.config.bucket, size = data.len()))]
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(path)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(sdk_error)?;
        debug!("object written");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3", bucket = %self.config.bucket))]
    async fn put_file(&self, path: &str, local: &Path) -> Result<(), StoreError> {
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(path)
            .body(body)
            .send()
            .await
            .map_err(sdk_error)?;
        info!("file uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "s3", bucket = %self.config.bucket))]
    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Err(StoreError::NotFound(path.to_owned()));
            }
            Err(e) => return Err(sdk_error(e)),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(format!("failed to read object body: {e}")))?;
        Ok(body.into_bytes())
    }

    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(sdk_error(e)),
        }
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<String, StoreError>> {
        let client = &self.client;
        let bucket = self.config.bucket.as_str();
        let prefix = prefix.to_owned();
        paginate(move |token: Option<String>| {
            let request = client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix.as_str())
                .set_continuation_token(token);
            async move {
                let output = request.send().await.map_err(sdk_error)?;
                let keys = output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_owned))
                    .collect();
                let next_token = output
                    .next_continuation_token()
                    .map(str::to_owned)
                    .filter(|_| output.is_truncated().unwrap_or(false));
                debug!(next = next_token.is_some(), "listed S3 page");
                Ok(ListPage { keys, next_token })
            }
        })
    }

    fn source_url(&self, path: &str) -> String {
        self.config.object_url(path)
    }
}
