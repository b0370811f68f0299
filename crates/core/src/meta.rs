use serde::{Deserialize, Serialize};

/// Version pointer of a module that has never been published.
pub const ZERO_VERSION: &str = "0.0.0";

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One published version record inside a module's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// The version label the release was published under.
    pub version: String,
    /// Last publish time of this version (epoch milliseconds).
    pub updated: i64,
}

/// The metadata record persisted once per module at `<name>/meta.json`.
///
/// Values are treated as immutable: [`ModuleMeta::record_release`] consumes
/// the record and returns the updated one, which the caller then persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMeta {
    /// Module name.
    pub name: String,
    /// The most recently published canonical version.
    pub version: String,
    /// Creation time of the record (epoch milliseconds). Never changes.
    pub created: i64,
    /// Time of the last metadata write (epoch milliseconds).
    pub updated: i64,
    /// Releases in publish order, unique by `version`.
    pub releases: Vec<Release>,
}

impl ModuleMeta {
    /// Synthesize the zero-state record for a module with no metadata yet.
    pub fn new(name: impl Into<String>, now: i64) -> Self {
        Self {
            name: name.into(),
            version: ZERO_VERSION.to_owned(),
            created: now,
            updated: now,
            releases: Vec::new(),
        }
    }

    /// Returns `true` once at least one release has moved the version pointer.
    pub fn is_published(&self) -> bool {
        self.version != ZERO_VERSION
    }

    /// Look up the release entry for an exact version label.
    pub fn release(&self, version: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.version == version)
    }

    /// Record a publish of `version` at `now`.
    ///
    /// If `version` already has a release entry its timestamp is refreshed in
    /// place and the version pointer is left alone; otherwise a new entry is
    /// appended and the pointer moves to `version`. `updated` is always set.
    #[must_use]
    pub fn record_release(mut self, version: &str, now: i64) -> Self {
        if let Some(existing) = self.releases.iter_mut().find(|r| r.version == version) {
            existing.updated = now;
        } else {
            self.releases.push(Release {
                version: version.to_owned(),
                updated: now,
            });
            version.clone_into(&mut self.version);
        }
        self.updated = now;
        self
    }
}

/// An entry returned by a registry listing.
///
/// Listing all modules yields names only; listing one module yields one
/// entry per release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleListItem {
    /// Module name.
    pub name: String,
    /// Release version, when listing a single module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ModuleListItem {
    /// An entry carrying only a module name.
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// An entry for one release of a module.
    pub fn release(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_state() {
        let meta = ModuleMeta::new("vpc", 10);
        assert_eq!(meta.version, "0.0.0");
        assert_eq!(meta.created, 10);
        assert_eq!(meta.updated, 10);
        assert!(meta.releases.is_empty());
        assert!(!meta.is_published());
    }

    #[test]
    fn record_new_release_moves_pointer() {
        let meta = ModuleMeta::new("vpc", 1).record_release("1.2.3", 5);
        assert_eq!(meta.version, "1.2.3");
        assert_eq!(meta.created, 1);
        assert_eq!(meta.updated, 5);
        assert_eq!(
            meta.releases,
            vec![Release {
                version: "1.2.3".into(),
                updated: 5
            }]
        );
        assert!(meta.is_published());
    }

    #[test]
    fn record_existing_release_refreshes_in_place() {
        let meta = ModuleMeta::new("vpc", 1)
            .record_release("1.0.0", 2)
            .record_release("1.1.0", 3)
            .record_release("1.0.0", 9);

        assert_eq!(meta.releases.len(), 2);
        assert_eq!(meta.release("1.0.0").map(|r| r.updated), Some(9));
        assert_eq!(meta.release("1.1.0").map(|r| r.updated), Some(3));
        // The pointer stays on the last newly appended version.
        assert_eq!(meta.version, "1.1.0");
        assert_eq!(meta.updated, 9);
    }

    #[test]
    fn releases_keep_insertion_order() {
        let meta = ModuleMeta::new("vpc", 0)
            .record_release("2.0.0", 1)
            .record_release("beta", 2)
            .record_release("1.0.0", 3);
        let versions: Vec<&str> = meta.releases.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, ["2.0.0", "beta", "1.0.0"]);
        assert_eq!(meta.version, "1.0.0");
    }

    #[test]
    fn json_shape_matches_stored_format() {
        let meta = ModuleMeta::new("vpc", 100).record_release("1.2.3", 200);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "vpc",
                "version": "1.2.3",
                "created": 100,
                "updated": 200,
                "releases": [{"version": "1.2.3", "updated": 200}]
            })
        );
    }

    #[test]
    fn parses_stored_record() {
        let raw = r#"{"name":"vpc","version":"1.2.3","created":1,"updated":3,
            "releases":[{"version":"1.2.2","updated":1},{"version":"1.2.3","updated":3}]}"#;
        let meta: ModuleMeta = serde_json::from_str(raw).unwrap();
        assert_eq!(meta.releases.len(), 2);
        assert_eq!(meta.version, "1.2.3");
    }

    #[test]
    fn list_item_omits_missing_version() {
        let json = serde_json::to_string(&ModuleListItem::module("vpc")).unwrap();
        assert_eq!(json, r#"{"name":"vpc"}"#);
        let json = serde_json::to_string(&ModuleListItem::release("vpc", "1")).unwrap();
        assert_eq!(json, r#"{"name":"vpc","version":"1"}"#);
    }
}
