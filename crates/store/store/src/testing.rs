use bytes::Bytes;

use crate::error::StoreError;
use crate::store::{BlobStore, collect_keys};

/// Run the full blob store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if a store operation fails outright; assertion failures
/// panic.
pub async fn run_store_conformance_tests(store: &dyn BlobStore) -> Result<(), StoreError> {
    test_get_missing(store).await?;
    test_exists_missing(store).await?;
    test_put_and_get(store).await?;
    test_put_overwrites(store).await?;
    test_put_file(store).await?;
    test_list_prefix(store).await?;
    test_list_empty_prefix(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn BlobStore) -> Result<(), StoreError> {
    let result = store.get("conformance/missing/module.zip").await;
    assert!(
        matches!(result, Err(StoreError::NotFound(_))),
        "get on a missing path should return NotFound"
    );
    Ok(())
}

async fn test_exists_missing(store: &dyn BlobStore) -> Result<(), StoreError> {
    let exists = store.exists("conformance/missing/meta.json").await?;
    assert!(!exists, "exists on a missing path should return false");
    Ok(())
}

async fn test_put_and_get(store: &dyn BlobStore) -> Result<(), StoreError> {
    let path = "conformance/put-get/meta.json";
    store.put(path, Bytes::from_static(b"{\"a\":1}")).await?;
    assert!(store.exists(path).await?, "exists should be true after put");
    let data = store.get(path).await?;
    assert_eq!(&data[..], b"{\"a\":1}");
    Ok(())
}

async fn test_put_overwrites(store: &dyn BlobStore) -> Result<(), StoreError> {
    let path = "conformance/overwrite/module.zip";
    store.put(path, Bytes::from_static(b"first")).await?;
    store.put(path, Bytes::from_static(b"second")).await?;
    let data = store.get(path).await?;
    assert_eq!(&data[..], b"second", "put should replace existing content");
    Ok(())
}

async fn test_put_file(store: &dyn BlobStore) -> Result<(), StoreError> {
    let dir = std::env::temp_dir().join(format!(
        "modreg-conformance-{}-{}",
        std::process::id(),
        store.name()
    ));
    tokio::fs::create_dir_all(&dir).await?;
    let local = dir.join("module.zip");
    tokio::fs::write(&local, b"zip-bytes").await?;

    let path = "conformance/put-file/1.0.0/module.zip";
    let result = store.put_file(path, &local).await;
    let _ = tokio::fs::remove_dir_all(&dir).await;
    result?;

    let data = store.get(path).await?;
    assert_eq!(&data[..], b"zip-bytes");
    Ok(())
}

async fn test_list_prefix(store: &dyn BlobStore) -> Result<(), StoreError> {
    store
        .put("conformance/list/a/meta.json", Bytes::from_static(b"a"))
        .await?;
    store
        .put("conformance/list/a/1/module.zip", Bytes::from_static(b"a1"))
        .await?;
    store
        .put("conformance/list/b/meta.json", Bytes::from_static(b"b"))
        .await?;
    store
        .put("conformance/other/c/meta.json", Bytes::from_static(b"c"))
        .await?;

    let mut keys = collect_keys(store, "conformance/list/").await?;
    keys.sort();
    assert_eq!(
        keys,
        [
            "conformance/list/a/1/module.zip",
            "conformance/list/a/meta.json",
            "conformance/list/b/meta.json",
        ],
        "list should return exactly the keys under the prefix"
    );
    Ok(())
}

async fn test_list_empty_prefix(store: &dyn BlobStore) -> Result<(), StoreError> {
    let keys = collect_keys(store, "conformance/nothing-here/").await?;
    assert!(keys.is_empty(), "list under an unused prefix should be empty");

    let all = collect_keys(store, "").await?;
    assert!(
        all.iter().any(|k| k == "conformance/other/c/meta.json"),
        "list with an empty prefix should include every key"
    );
    Ok(())
}
