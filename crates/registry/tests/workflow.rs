//! End-to-end publish, get and list flows over the in-process and local
//! filesystem backends.

use std::path::Path;

use modreg_core::{ModuleListItem, ModuleMeta};
use modreg_registry::{
    AnyStore, BackendConfig, LocalBackend, PublishRequest, Registry, RegistryError, ZipArchiver,
    build_registry, publish,
};
use modreg_store::BlobStore;

// -- Fixtures --

fn module_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
    dir
}

async fn memory_registry() -> Registry<AnyStore> {
    build_registry(&BackendConfig::Memory).await.unwrap()
}

async fn publish_version(registry: &Registry<AnyStore>, name: &str, version: &str, src: &Path) {
    publish(
        registry,
        &ZipArchiver::new(),
        &PublishRequest::new(name, version, src),
    )
    .await
    .unwrap();
}

// -- Publish and get --

#[tokio::test]
async fn latest_points_at_published_version() {
    let registry = memory_registry().await;
    let src = module_dir(&[("main.tf", "resource {}")]);
    publish_version(&registry, "vpc", "1.2.3", src.path()).await;

    let url = registry.get_source_url("vpc", None).await.unwrap();
    assert_eq!(url, "memory://vpc/1.2.3/module.zip");
}

#[tokio::test]
async fn alias_artifact_matches_canonical_artifact() {
    let registry = memory_registry().await;
    let src = module_dir(&[("main.tf", "resource {}")]);
    publish_version(&registry, "vpc", "1.2.3", src.path()).await;

    let url = registry.get_source_url("vpc", Some("1.2")).await.unwrap();
    assert_eq!(url, "memory://vpc/1.2/module.zip");

    let store = registry.store();
    let alias = store.get("vpc/1.2/module.zip").await.unwrap();
    let canonical = store.get("vpc/1.2.3/module.zip").await.unwrap();
    let latest = store.get("vpc/latest/module.zip").await.unwrap();
    assert_eq!(alias, canonical);
    assert_eq!(latest, canonical);
}

#[tokio::test]
async fn partial_versions_resolve_to_newest_release() {
    let registry = memory_registry().await;
    let src = module_dir(&[("main.tf", "v")]);
    for version in ["1.2.2", "1.2.3", "beta"] {
        publish_version(&registry, "vpc", version, src.path()).await;
    }

    let (version, url) = registry.resolve("vpc", "1").await.unwrap();
    assert_eq!(version, "1.2.3");
    assert_eq!(url, "memory://vpc/1.2.3/module.zip");

    assert_eq!(registry.resolve("vpc", "1.2.2").await.unwrap().0, "1.2.2");
    assert_eq!(registry.resolve("vpc", "beta").await.unwrap().0, "beta");
    // `latest` follows the most recent publish, which was the custom label.
    assert_eq!(registry.resolve("vpc", "latest").await.unwrap().0, "beta");

    for target in ["2", "alpha"] {
        let err = registry.resolve("vpc", target).await.unwrap_err();
        assert!(
            matches!(err, RegistryError::VersionResolution { .. }),
            "{target}: {err}"
        );
    }
}

#[tokio::test]
async fn unpublished_module_resolves_semver_to_zero_state() {
    let registry = memory_registry().await;
    assert_eq!(registry.get_meta("ghost").await.unwrap().version, "0.0.0");

    // The zero version has no artifact behind it.
    let err = registry.resolve("ghost", "1").await.unwrap_err();
    assert!(matches!(err, RegistryError::ModuleNotFound { .. }));

    let err = registry.get_source_url("ghost", None).await.unwrap_err();
    assert!(matches!(err, RegistryError::ModuleNotFound { version: None, .. }));
}

#[tokio::test]
async fn republish_without_overwrite_keeps_first_release() {
    let registry = memory_registry().await;
    let first = module_dir(&[("main.tf", "first")]);
    let second = module_dir(&[("main.tf", "second")]);
    publish_version(&registry, "vpc", "1.0.0", first.path()).await;
    let before_meta = registry.get_meta("vpc").await.unwrap();
    let before_zip = registry.store().get("vpc/1.0.0/module.zip").await.unwrap();

    let err = publish(
        &registry,
        &ZipArchiver::new(),
        &PublishRequest::new("vpc", "1.0.0", second.path()),
    )
    .await
    .unwrap_err();
    assert!(err.is_user_facing());
    assert_eq!(
        err.to_string(),
        "module already exists in the given backend: vpc@1.0.0"
    );

    assert_eq!(registry.get_meta("vpc").await.unwrap(), before_meta);
    assert_eq!(
        registry.store().get("vpc/1.0.0/module.zip").await.unwrap(),
        before_zip
    );
}

#[tokio::test]
async fn overwrite_replaces_artifact_and_keeps_single_release() {
    let registry = memory_registry().await;
    let first = module_dir(&[("main.tf", "first")]);
    let second = module_dir(&[("main.tf", "second")]);
    publish_version(&registry, "vpc", "1.0.0", first.path()).await;
    let before_zip = registry.store().get("vpc/1.0.0/module.zip").await.unwrap();

    let outcome = publish(
        &registry,
        &ZipArchiver::new(),
        &PublishRequest::new("vpc", "1.0.0", second.path()).with_overwrite(true),
    )
    .await
    .unwrap();

    assert_eq!(outcome.meta.releases.len(), 1);
    assert_ne!(
        registry.store().get("vpc/1.0.0/module.zip").await.unwrap(),
        before_zip
    );
}

#[tokio::test]
async fn dry_run_leaves_backend_empty() {
    let registry = memory_registry().await;
    let src = module_dir(&[("main.tf", "x")]);
    let outcome = publish(
        &registry,
        &ZipArchiver::new(),
        &PublishRequest::new("vpc", "3.1.4", src.path()).with_dry_run(true),
    )
    .await
    .unwrap();

    assert_eq!(outcome.labels, ["latest", "3", "3.1", "3.1.4"]);
    assert!(!registry.exists("vpc", None).await.unwrap());
    assert!(registry.list(None).await.unwrap().is_empty());
}

// -- Listing --

#[tokio::test]
async fn list_dedups_module_names() {
    let registry = memory_registry().await;
    let src = module_dir(&[("main.tf", "x")]);
    for (name, version) in [("vpc", "1.0.0"), ("vpc", "1.1.0"), ("dns", "0.1.0")] {
        publish_version(&registry, name, version, src.path()).await;
    }

    let mut names: Vec<String> = registry
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    names.sort();
    assert_eq!(names, ["dns", "vpc"]);

    let releases = registry.list(Some("vpc")).await.unwrap();
    assert_eq!(
        releases,
        [
            ModuleListItem::release("vpc", "1.0.0"),
            ModuleListItem::release("vpc", "1.1.0")
        ]
    );
}

#[tokio::test]
async fn list_unknown_module_is_not_found() {
    let registry = memory_registry().await;
    let err = registry.list(Some("ghost")).await.unwrap_err();
    assert!(matches!(err, RegistryError::ModuleNotFound { .. }));
}

// -- Local filesystem backend --

#[tokio::test]
async fn local_backend_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let config = BackendConfig::Local(LocalBackend {
        path: root.path().to_path_buf(),
    });
    let registry = build_registry(&config).await.unwrap();
    let src = module_dir(&[("main.tf", "resource {}"), ("vars/x.tf", "variable {}")]);
    publish_version(&registry, "vpc", "2.0.0", src.path()).await;

    assert!(root.path().join("vpc/meta.json").is_file());
    for label in ["latest", "2", "2.0", "2.0.0"] {
        assert!(root.path().join(format!("vpc/{label}/module.zip")).is_file());
    }

    let raw = std::fs::read(root.path().join("vpc/meta.json")).unwrap();
    let on_disk: ModuleMeta = serde_json::from_slice(&raw).unwrap();
    assert_eq!(on_disk, registry.get_meta("vpc").await.unwrap());
    assert_eq!(on_disk.version, "2.0.0");

    let url = registry.get_source_url("vpc", Some("2")).await.unwrap();
    assert!(url.ends_with("vpc/2/module.zip"), "{url}");
}

#[tokio::test]
async fn prefixed_registries_are_isolated() {
    let root = tempfile::tempdir().unwrap();
    let store = || {
        modreg_store_local::LocalBlobStore::new(modreg_store_local::LocalConfig::new(root.path()))
    };
    let team_a = Registry::new(store()).with_prefix("team-a/");
    let team_b = Registry::new(store()).with_prefix("team-b/");
    let src = module_dir(&[("main.tf", "x")]);

    publish(
        &team_a,
        &ZipArchiver::new(),
        &PublishRequest::new("vpc", "1.0.0", src.path()),
    )
    .await
    .unwrap();

    assert_eq!(
        team_a.list(None).await.unwrap(),
        [ModuleListItem::module("vpc")]
    );
    assert!(team_b.list(None).await.unwrap().is_empty());
    assert!(root.path().join("team-a/vpc/meta.json").is_file());
}
