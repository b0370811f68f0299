//! Azure Blob Storage adapter for the modreg blob store.
//!
//! - **Blob Storage** (`blob` feature): blobs in a single container via
//!   `azure_storage_blob`
//!
//! Service principal credentials and the endpoint override (e.g. `Azurite`)
//! live in [`AzureBaseConfig`].

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "blob")]
pub mod blob;

// Re-exports for convenience.
pub use config::AzureBaseConfig;
pub use error::AzureStoreError;

#[cfg(feature = "blob")]
pub use blob::{AzureBlobStore, BlobConfig};
