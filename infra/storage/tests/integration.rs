use chrono::{Local, NaiveDate, TimeZone};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use proptest::prelude::*;
use quire_storage::*;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::TempDir;
use uuid::Uuid;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

async fn local_manager(temp: &TempDir) -> StorageManager {
    let local = LocalBackend::builder().root(temp.path().join("storage")).connect().await.unwrap();
    StorageManager::builder().local(local).default_backend(BackendKind::Local).build().unwrap()
}

fn object_manager(connector: Arc<MemoryConnector>, bucket: &str) -> StorageManager {
    StorageManager::builder()
        .object(ObjectBackend::new(bucket, connector))
        .default_backend(BackendKind::Object)
        .build()
        .unwrap()
}

fn local_path(saved: &Saved) -> PathBuf {
    match &saved.location {
        StorageLocation::Local(path) => path.clone(),
        other => panic!("expected a local location, got {other}"),
    }
}

fn set_mtime(path: &Path, date: (i32, u32, u32)) {
    let naive =
        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap().and_hms_opt(12, 0, 0).unwrap();
    let when = SystemTime::from(Local.from_local_datetime(&naive).single().unwrap());
    std::fs::File::options().write(true).open(path).unwrap().set_modified(when).unwrap();
}

#[tokio::test]
async fn test_local_roundtrip_injects_metadata() {
    let temp = TempDir::new().unwrap();
    let manager = local_manager(&temp).await;

    let saved = manager
        .save(doc(json!({"title": "Hello", "body": "World"})), "blog")
        .await
        .into_result()
        .unwrap();

    assert_eq!(saved.storage_type, BackendKind::Local);
    assert_eq!(saved.metadata.filepath.category(), "blog");
    assert_eq!(saved.metadata.version, METADATA_VERSION);

    let path = local_path(&saved);
    assert!(path.is_absolute());
    assert!(path.ends_with(saved.metadata.filepath.as_str()));

    let by_key =
        manager.retrieve(saved.metadata.filepath.as_str(), None).await.into_result().unwrap();
    let by_path = manager.retrieve(&path.to_string_lossy(), None).await.into_result().unwrap();
    assert_eq!(by_key.content, by_path.content);

    let content = by_key.content;
    assert_eq!(content["title"], "Hello");
    assert_eq!(content["body"], "World");
    assert_eq!(content[METADATA_FIELD]["filepath"], saved.metadata.filepath.as_str());
    assert_eq!(content[METADATA_FIELD]["version"], "1.0");
    assert!(by_key.metadata.size > 0);
}

#[tokio::test]
async fn test_object_roundtrip_uses_s3_location() {
    let connector = Arc::new(MemoryConnector::new());
    let manager = object_manager(connector, "content");

    let saved = manager
        .save(doc(json!({"title": "Hello", "storage_metadata": "caller value"})), "news")
        .await
        .into_result()
        .unwrap();

    assert_eq!(saved.storage_type, BackendKind::Object);
    let location = saved.location.to_string();
    assert_eq!(location, format!("s3://content/{}", saved.metadata.filepath));

    let read = manager.retrieve(&location, None).await.into_result().unwrap();
    assert_eq!(read.content["title"], "Hello");
    assert_eq!(read.content[METADATA_FIELD]["filepath"], saved.metadata.filepath.as_str());

    let bare = manager.retrieve(saved.metadata.filepath.as_str(), None).await;
    assert_eq!(bare.into_result().unwrap().content, read.content);
}

#[test]
fn test_generated_keys_are_unique() {
    let keys: HashSet<StorageKey> =
        (0..10_000).map(|_| StorageKey::generate("blog").unwrap()).collect();
    assert_eq!(keys.len(), 10_000);
}

#[tokio::test]
async fn test_listing_is_partitioned_by_category_on_both_backends() {
    let temp = TempDir::new().unwrap();
    let local = local_manager(&temp).await;
    let object = object_manager(Arc::new(MemoryConnector::new()), "content");

    for manager in [&local, &object] {
        for _ in 0..2 {
            assert!(manager.save(doc(json!({"k": "blog"})), "blog").await.is_success());
        }
        assert!(manager.save(doc(json!({"k": "blogger"})), "blogger").await.is_success());
        assert!(manager.save(doc(json!({"k": "news"})), "news").await.is_success());

        let blog = manager.list(&ListQuery::new().category("blog")).await.into_result().unwrap();
        assert_eq!(blog.count, 2, "{:?}", manager.default_backend());
        assert!(blog.items.iter().all(|item| item.key.category() == "blog"));
        assert!(blog.items.iter().all(|item| item.key.as_str().starts_with("blog/")));

        let blogger =
            manager.list(&ListQuery::new().category("blogger")).await.into_result().unwrap();
        assert_eq!(blogger.count, 1);

        let all = manager.list(&ListQuery::new()).await.into_result().unwrap();
        assert_eq!(all.count, 4);
    }
}

#[tokio::test]
async fn test_listing_honours_limit_on_both_backends() {
    let temp = TempDir::new().unwrap();
    let local = local_manager(&temp).await;
    let object = object_manager(Arc::new(MemoryConnector::new()), "content");

    for manager in [&local, &object] {
        for i in 0..5 {
            assert!(manager.save(doc(json!({"i": i})), "blog").await.is_success());
        }

        let three = manager.list(&ListQuery::new().limit(3)).await.into_result().unwrap();
        assert_eq!(three.count, 3);
        assert_eq!(three.items.len(), 3);

        let none = manager.list(&ListQuery::new().limit(0)).await.into_result().unwrap();
        assert_eq!(none.count, 0);
    }
}

#[tokio::test]
async fn test_local_lexical_date_filter_selects_middle_day() {
    let temp = TempDir::new().unwrap();
    let manager = local_manager(&temp).await;

    let mut middle = None;
    for (i, date) in [(2024, 1, 10), (2024, 2, 10), (2024, 3, 10)].into_iter().enumerate() {
        let saved = manager.save(doc(json!({"i": i})), "blog").await.into_result().unwrap();
        set_mtime(&local_path(&saved), date);
        if i == 1 {
            middle = Some(saved.metadata.filepath);
        }
    }

    let query = ListQuery::new().category("blog").start_date("2024-02-01").end_date("2024-02-28");
    let listing = manager.list(&query).await.into_result().unwrap();

    assert_eq!(listing.count, 1);
    assert_eq!(Some(&listing.items[0].key), middle.as_ref());
    assert!(listing.items[0].last_modified.starts_with("2024-02-10T12:00:00"));
}

#[tokio::test]
async fn test_local_parsed_date_filter_covers_whole_end_day() {
    let temp = TempDir::new().unwrap();
    let manager = local_manager(&temp).await;

    for date in [(2024, 1, 10), (2024, 2, 10), (2024, 3, 10)] {
        let saved = manager.save(doc(json!({"d": date.1})), "blog").await.into_result().unwrap();
        set_mtime(&local_path(&saved), date);
    }

    let query = ListQuery::new()
        .start_date("2024-02-10")
        .end_date("2024-02-10")
        .date_filter(DateFilter::Parsed);
    let listing = manager.list(&query).await.into_result().unwrap();
    assert_eq!(listing.count, 1);

    let bad = manager
        .list(&ListQuery::new().start_date("last tuesday").date_filter(DateFilter::Parsed))
        .await;
    assert_eq!(bad.failure().map(|f| f.kind), Some(ErrorKind::InvalidInput));
}

#[tokio::test]
async fn test_object_listing_ignores_date_bounds() {
    let manager = object_manager(Arc::new(MemoryConnector::new()), "content");
    assert!(manager.save(doc(json!({"a": 1})), "blog").await.is_success());

    let query = ListQuery::new().start_date("2999-01-01").end_date("2999-12-31");
    let listing = manager.list(&query).await.into_result().unwrap();
    assert_eq!(listing.count, 1);
}

#[tokio::test]
async fn test_missing_documents_are_not_found_on_both_backends() {
    let temp = TempDir::new().unwrap();
    let local = local_manager(&temp).await;
    let object = object_manager(Arc::new(MemoryConnector::new()), "content");

    let missing = "blog/2024/01/01/00000000-0000-4000-8000-000000000000.json";
    for manager in [&local, &object] {
        let envelope = manager.retrieve(missing, None).await;
        assert_eq!(envelope.failure().map(|f| f.kind), Some(ErrorKind::NotFound));
    }

    let envelope = object.retrieve("s3://content/blog/nope.json", None).await;
    assert_eq!(envelope.failure().map(|f| f.kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_missing_category_lists_empty() {
    let temp = TempDir::new().unwrap();
    let local = local_manager(&temp).await;
    let object = object_manager(Arc::new(MemoryConnector::new()), "content");

    for manager in [&local, &object] {
        let envelope = manager.list(&ListQuery::new().category("nonexistent")).await;
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({"status": "success", "items": [], "count": 0}));
    }
}

#[tokio::test]
async fn test_qualified_reference_reads_other_bucket() {
    let connector = Arc::new(MemoryConnector::new());
    connector
        .bucket("bucketA")
        .put(&ObjectPath::from("key1"), PutPayload::from_static(br#"{"origin":"a"}"#))
        .await
        .unwrap();

    let manager = object_manager(Arc::clone(&connector), "bucketB");

    let read = manager.retrieve("store://bucketA/key1", None).await.into_result().unwrap();
    assert_eq!(read.content["origin"], "a");

    let same = manager.retrieve("s3://bucketA/key1", None).await.into_result().unwrap();
    assert_eq!(same.content, read.content);

    let default_bucket = manager.retrieve("key1", None).await;
    assert_eq!(default_bucket.failure().map(|f| f.kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_reference_auto_detection_with_mixed_backends() {
    let temp = TempDir::new().unwrap();
    let connector = Arc::new(MemoryConnector::new());
    connector
        .bucket("archive")
        .put(&ObjectPath::from("blog/old.json"), PutPayload::from_static(br#"{"old":true}"#))
        .await
        .unwrap();

    let manager = StorageManager::builder()
        .local(LocalBackend::builder().root(temp.path()).connect().await.unwrap())
        .object(ObjectBackend::new("archive", connector))
        .default_backend(BackendKind::Local)
        .build()
        .unwrap();

    let saved = manager.save(doc(json!({"new": true})), "blog").await.into_result().unwrap();
    assert!(matches!(saved.location, StorageLocation::Local(_)));

    let object = manager.retrieve("s3://archive/blog/old.json", None).await.into_result().unwrap();
    assert_eq!(object.content["old"], true);

    let forced = manager.retrieve("blog/old.json", Some(true)).await.into_result().unwrap();
    assert_eq!(forced.content, object.content);

    let local = manager.retrieve("blog/old.json", None).await;
    assert_eq!(local.failure().map(|f| f.kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_corrupt_and_escaping_reads_are_classified() {
    let temp = TempDir::new().unwrap();
    let manager = local_manager(&temp).await;

    let broken = temp.path().join("storage").join("blog");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("broken.json"), b"{\"title\": ").unwrap();

    let corrupt = manager.retrieve("blog/broken.json", None).await;
    assert_eq!(corrupt.failure().map(|f| f.kind), Some(ErrorKind::Corrupt));

    let escape = manager.retrieve("../../etc/passwd", None).await;
    assert_eq!(escape.failure().map(|f| f.kind), Some(ErrorKind::InvalidInput));
}

#[tokio::test]
async fn test_invalid_category_is_rejected() {
    let temp = TempDir::new().unwrap();
    let manager = local_manager(&temp).await;

    for category in ["", "..", "a/b", "blog post"] {
        let envelope = manager.save(doc(json!({"a": 1})), category).await;
        assert_eq!(envelope.failure().map(|f| f.kind), Some(ErrorKind::InvalidInput));
    }

    let envelope = manager.list(&ListQuery::new().category("../etc")).await;
    assert_eq!(envelope.failure().map(|f| f.kind), Some(ErrorKind::InvalidInput));
}

#[tokio::test]
async fn test_stale_temp_files_are_purged_on_connect() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("blog");
    std::fs::create_dir_all(&dir).unwrap();

    let orphan = dir.join("a.json.quiretmp.9");
    std::fs::write(&orphan, b"{").unwrap();
    let old = SystemTime::now() - std::time::Duration::from_secs(3600);
    std::fs::File::options().write(true).open(&orphan).unwrap().set_modified(old).unwrap();

    let local = LocalBackend::builder().root(temp.path()).connect().await.unwrap();
    assert!(!orphan.exists());

    let listing = local.list(&ListQuery::new()).await.unwrap();
    assert!(listing.is_empty());
}

proptest! {
    #[test]
    fn prop_key_layout(
        category in "[a-z0-9_-]{1,32}",
        year in 1970i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        id in any::<u128>(),
    ) {
        let category = Category::try_from(category.as_str()).unwrap();
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let key = StorageKey::generate_at(&category, date, Uuid::from_u128(id));

        let parts: Vec<&str> = key.as_str().split('/').collect();
        prop_assert_eq!(parts.len(), 5);
        prop_assert_eq!(parts[0], category.as_str());
        prop_assert_eq!(parts[1], format!("{year:04}"));
        prop_assert_eq!(parts[2], format!("{month:02}"));
        prop_assert_eq!(parts[3], format!("{day:02}"));

        let stem = parts[4].strip_suffix(DOCUMENT_SUFFIX).unwrap();
        prop_assert_eq!(Uuid::parse_str(stem).unwrap(), Uuid::from_u128(id));
        prop_assert_eq!(key.category(), category.as_str());
    }
}
