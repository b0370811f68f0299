//! Google Cloud Storage adapter for the modreg blob store.
//!
//! - **Cloud Storage** (`storage` feature): objects in a single bucket via
//!   `google-cloud-storage`
//!
//! Project, service account key and endpoint override (e.g.
//! `fake-gcs-server`) live in [`GcpBaseConfig`].

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "storage")]
pub mod storage;

// Re-exports for convenience.
pub use config::GcpBaseConfig;
pub use error::GcpStoreError;

#[cfg(feature = "storage")]
pub use storage::{GcsBlobStore, StorageConfig};
