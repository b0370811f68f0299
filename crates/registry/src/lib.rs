//! Module registry on top of a [`BlobStore`](modreg_store::BlobStore).
//!
//! - [`Registry`]: name and version label to physical path mapping, metadata
//!   reads and writes, listing and version resolution.
//! - [`publish`]: the archive, conflict check, upload and metadata workflow.
//! - [`build_registry`]: turns a [`BackendConfig`] into a ready registry.
//! - [`ProjectConfig`]: the `modreg.toml` project file.

pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
pub mod factory;
pub mod publish;

pub use archive::{Archiver, ZipArchiver};
pub use backend::Registry;
pub use config::{CONFIG_FILE, ModuleConfig, ProjectConfig};
pub use error::RegistryError;
pub use factory::{
    AnyStore, AzureBackend, BackendConfig, GcpBackend, LocalBackend, S3Backend, build_registry,
    build_store,
};
pub use publish::{
    PublishOptions, PublishOutcome, PublishRequest, publish, publish_artifact, upload_labels,
};
