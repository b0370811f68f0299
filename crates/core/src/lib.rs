//! Core types shared by every modreg crate.
//!
//! - [`ModuleMeta`] / [`Release`]: the per-module metadata record persisted
//!   as `meta.json`.
//! - [`layout`]: the canonical object layout every backend shares.
//! - [`version`]: semver detection, alias expansion and version resolution.

pub mod layout;
pub mod meta;
pub mod name;
pub mod version;

pub use layout::{ARTIFACT_FILE, LATEST, META_FILE, artifact_path, meta_path};
pub use meta::{ModuleListItem, ModuleMeta, Release, ZERO_VERSION, now_millis};
pub use name::{validate_module_name, validate_version_label};
pub use version::{ResolveError, expand_version, is_semver, is_semver_like, resolve_version};
