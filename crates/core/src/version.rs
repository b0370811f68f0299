//! Version engine.
//!
//! Pure functions over version labels: strict semver detection, alias
//! expansion for publishing, and resolution of a user-supplied version token
//! against a module's release history.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::layout::LATEST;
use crate::meta::{ModuleMeta, ZERO_VERSION};

static SEMVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("semver regex is valid"));

static SEMVER_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+){0,2}$").expect("semver-like regex is valid"));

/// Errors raised when a version token cannot be mapped to a release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A named (non-semver) label has no release entry.
    #[error("no release named '{0}'")]
    UnknownLabel(String),

    /// No fully semver release starts with the requested version.
    #[error("no release matches version '{0}'")]
    NoMatchingRelease(String),
}

/// Returns `true` iff `s` is exactly `MAJOR.MINOR.PATCH` with numeric parts.
pub fn is_semver(s: &str) -> bool {
    SEMVER_RE.is_match(s)
}

/// Returns `true` for one to three dot-separated numeric components
/// (`1`, `1.2`, `1.2.3`).
pub fn is_semver_like(s: &str) -> bool {
    SEMVER_LIKE_RE.is_match(s)
}

/// Expand a version into the labels it is stored under, least specific first.
///
/// `1.2.3` expands to `["1", "1.2", "1.2.3"]`; any other label is returned
/// unexpanded.
pub fn expand_version(version: &str) -> Vec<String> {
    match SEMVER_RE.captures(version) {
        Some(caps) => {
            let major = &caps[1];
            let minor = &caps[2];
            vec![
                major.to_owned(),
                format!("{major}.{minor}"),
                version.to_owned(),
            ]
        }
        None => vec![version.to_owned()],
    }
}

/// Resolve a version token to a concrete release version.
///
/// - `latest` resolves to the module's version pointer.
/// - A non-numeric label must name an existing release exactly.
/// - A full or partial semver resolves to the greatest fully semver release
///   whose version string starts with the token.
///
/// A module that was never published resolves any numeric token to `0.0.0`
/// instead of failing.
pub fn resolve_version(meta: &ModuleMeta, target: &str) -> Result<String, ResolveError> {
    if target == LATEST {
        return Ok(meta.version.clone());
    }

    if !is_semver_like(target) {
        return match meta.release(target) {
            Some(release) => Ok(release.version.clone()),
            None => Err(ResolveError::UnknownLabel(target.to_owned())),
        };
    }

    let best = meta
        .releases
        .iter()
        .filter(|r| is_semver(&r.version) && r.version.starts_with(target))
        .filter_map(|r| {
            semver::Version::parse(&r.version)
                .ok()
                .map(|parsed| (parsed, &r.version))
        })
        .max_by(|a, b| a.0.cmp(&b.0));

    match best {
        Some((_, version)) => Ok(version.clone()),
        None if !meta.is_published() => Ok(ZERO_VERSION.to_owned()),
        None => Err(ResolveError::NoMatchingRelease(target.to_owned())),
    }
}
