//! Amazon S3 adapter for the modreg blob store.
//!
//! - **S3** (`s3` feature): objects in a single bucket via `aws-sdk-s3`
//!
//! Region, endpoint override and optional STS assume-role credentials are
//! carried by [`AwsBaseConfig`](config::AwsBaseConfig).

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "s3")]
pub mod s3;

// Re-exports for convenience.
pub use config::AwsBaseConfig;
pub use error::AwsStoreError;

#[cfg(feature = "s3")]
pub use s3::{S3BlobStore, S3Config};
