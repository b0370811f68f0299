//! Canonical object layout.
//!
//! ```text
//! <prefix><name>/meta.json
//! <prefix><name>/<label>/module.zip
//! ```
//!
//! The layout is shared by every backend so that registries written by one
//! client remain readable by another.

/// File name of the per-module metadata record.
pub const META_FILE: &str = "meta.json";

/// File name of every stored archive artifact.
pub const ARTIFACT_FILE: &str = "module.zip";

/// Version label that always points at the most recently published archive.
pub const LATEST: &str = "latest";

/// Path of the metadata record for `name`.
pub fn meta_path(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}/{META_FILE}")
}

/// Path of the archive stored under `label` for `name`.
pub fn artifact_path(prefix: &str, name: &str, label: &str) -> String {
    format!("{prefix}{name}/{label}/{ARTIFACT_FILE}")
}
