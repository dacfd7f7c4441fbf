//! Builds the [`StorageManager`] described by [`StorageConfig`].

use crate::domain::config::{ObjectStoreProvider, StorageConfig, StorageMedium};
use quire_storage::{BackendKind, LocalBackend, ObjectBackend, S3Options};
use tracing::info;

pub use quire_storage::{StorageError, StorageManager};

const fn backend_kind(medium: StorageMedium) -> BackendKind {
    match medium {
        StorageMedium::Local => BackendKind::Local,
        StorageMedium::Object => BackendKind::Object,
    }
}

/// Object driver for the configured bucket and provider.
#[must_use]
pub fn object_backend(cfg: &StorageConfig) -> ObjectBackend {
    match cfg.object.provider {
        ObjectStoreProvider::S3 => ObjectBackend::s3(
            cfg.bucket.as_str(),
            S3Options {
                region: Some(cfg.object.region.clone()),
                endpoint: cfg.object.endpoint.clone(),
                allow_http: cfg.object.allow_http,
            },
        ),
        ObjectStoreProvider::Memory => ObjectBackend::in_memory(cfg.bucket.as_str()),
    }
}

/// Opens both drivers and selects the configured default.
///
/// The local tree is always available so that explicit `is_ref=false` reads keep working
/// while the object store is the default, and vice versa.
///
/// # Errors
/// Returns [`StorageError`] if the local root cannot be created or resolved.
pub async fn init_storage(cfg: &StorageConfig) -> Result<StorageManager, StorageError> {
    let local = LocalBackend::builder().root(&cfg.root).connect().await?;
    let object = object_backend(cfg);

    info!(
        backend = ?cfg.backend,
        root = %local.root().display(),
        bucket = %cfg.bucket,
        provider = ?cfg.object.provider,
        "Storage configured"
    );

    StorageManager::builder()
        .local(local)
        .object(object)
        .default_backend(backend_kind(cfg.backend))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::ObjectStoreConfig;
    use quire_storage::ErrorKind;
    use tempfile::TempDir;

    fn memory_config(root: &std::path::Path, backend: StorageMedium) -> StorageConfig {
        StorageConfig {
            backend,
            root: root.to_path_buf(),
            bucket: "docs".to_owned(),
            object: ObjectStoreConfig {
                provider: ObjectStoreProvider::Memory,
                ..ObjectStoreConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn test_default_backend_follows_config() {
        let temp = TempDir::new().unwrap();

        let local = init_storage(&memory_config(temp.path(), StorageMedium::Local)).await.unwrap();
        assert_eq!(local.default_backend(), BackendKind::Local);

        let object = init_storage(&memory_config(temp.path(), StorageMedium::Object)).await.unwrap();
        assert_eq!(object.default_backend(), BackendKind::Object);
    }

    #[tokio::test]
    async fn test_both_media_are_reachable() {
        let temp = TempDir::new().unwrap();
        let manager =
            init_storage(&memory_config(temp.path(), StorageMedium::Object)).await.unwrap();

        let missing = manager.retrieve("blog/none.json", Some(false)).await;
        assert_eq!(missing.failure().map(|f| f.kind), Some(ErrorKind::NotFound));
    }
}
