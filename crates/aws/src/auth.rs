use tracing::{debug, info};

use crate::config::AwsBaseConfig;

/// Build an AWS SDK configuration from the given [`AwsBaseConfig`].
///
/// Credentials come from the standard environment chain. When `role_arn` is
/// set, they are used to assume that role via STS with automatic refresh.
///
/// # Examples
///
/// ```no_run
/// use modreg_aws::config::AwsBaseConfig;
/// use modreg_aws::auth::build_sdk_config;
///
/// # async fn example() {
/// let config = AwsBaseConfig::new("us-east-1")
///     .with_endpoint_url("http://localhost:4566");
/// let sdk_config = build_sdk_config(&config).await;
/// # }
/// ```
pub async fn build_sdk_config(config: &AwsBaseConfig) -> aws_config::SdkConfig {
    let region = aws_config::Region::new(config.region.clone());
    let mut loader = aws_config::from_env().region(region.clone());

    if let Some(endpoint) = &config.endpoint_url {
        debug!(endpoint = %endpoint, "using custom AWS endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    let Some(role_arn) = &config.role_arn else {
        return loader.load().await;
    };

    let session_name = config.session_name.as_deref().unwrap_or("modreg");
    info!(role_arn = %role_arn, session_name = %session_name, "assuming IAM role via STS");

    // STS calls use the base chain (and endpoint override) of the caller.
    let base_config = loader.load().await;

    let mut provider_builder = aws_config::sts::AssumeRoleProvider::builder(role_arn)
        .session_name(session_name)
        .region(region.clone());

    if let Some(external_id) = &config.external_id {
        provider_builder = provider_builder.external_id(external_id);
    }

    let assume_role_provider = provider_builder.configure(&base_config).build().await;

    let mut final_loader = aws_config::from_env()
        .region(region)
        .credentials_provider(assume_role_provider);

    if let Some(endpoint) = &config.endpoint_url {
        final_loader = final_loader.endpoint_url(endpoint);
    }

    final_loader.load().await
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    // The SDK needs a root certificate store to load, so these only run in
    // integration mode.

    #[tokio::test]
    async fn build_sdk_config_sets_region() {
        let config = AwsBaseConfig::new("ap-northeast-1");
        let sdk_config = build_sdk_config(&config).await;
        assert_eq!(
            sdk_config.region().map(|r| r.as_ref()),
            Some("ap-northeast-1")
        );
    }

    #[tokio::test]
    async fn build_sdk_config_with_endpoint() {
        let config = AwsBaseConfig::new("us-west-2").with_endpoint_url("http://localhost:4566");
        let sdk_config = build_sdk_config(&config).await;
        assert_eq!(sdk_config.region().map(|r| r.as_ref()), Some("us-west-2"));
    }
}
