//! Local filesystem driver.
//!
//! Documents live under a canonical root directory at `<root>/<key>`. Writes go through a
//! unique temp file, `fsync`, then `rename`, so readers see either the old file or the new one.
//! Listing walks the directory tree on a blocking thread and filters by modification time.

mod builder;
mod maintenance;
mod security;

pub use builder::LocalBackendBuilder;

use super::{BackendKind, Retrieved, StorageBackend, parse_document};
use crate::error::{StorageError, StorageErrorExt};
use crate::key::{DOCUMENT_SUFFIX, StorageKey};
use crate::location::StorageLocation;
use crate::query::{DateWindow, ListQuery, ListingItem, ObjectMetadata};
use crate::time;
use async_trait::async_trait;
use bytes::Bytes;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Shared state of a [`LocalBackend`].
#[derive(Debug)]
pub struct LocalInner {
    /// Canonical absolute root of the document tree.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// Driver persisting documents as files under a rooted directory tree.
///
/// Cloning is cheap; all clones share the same root and temp-file counter.
///
/// ```rust
/// use quire_storage::{ListQuery, LocalBackend, StorageBackend, StorageKey};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), quire_storage::StorageError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// let local = LocalBackend::builder().root(tmp.path().join("storage")).connect().await?;
///
/// let key = StorageKey::generate("blog")?;
/// local.save(&key, br#"{"title":"Hi"}"#.to_vec().into()).await?;
///
/// let found = local.list(&ListQuery::new().category("blog")).await?;
/// assert_eq!(found.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    pub(crate) inner: Arc<LocalInner>,
}

impl Deref for LocalBackend {
    type Target = LocalInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl LocalBackend {
    #[must_use = "The local backend is not opened until you call .connect()"]
    pub fn builder() -> LocalBackendBuilder {
        LocalBackendBuilder::new()
    }

    /// Canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative key to its physical path inside the root.
    ///
    /// # Errors
    /// Returns [`StorageError::PathTraversalAttempt`] if the key escapes the root.
    pub fn resolve(&self, key: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        security::resolve_key(&self.root, key)
    }

    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directories for {}", target.display()))?;
        }

        let temp = unique_tmp_path(target, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(data).await.context("Write failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, target).await {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                fs::remove_file(target)
                    .await
                    .context(format!("Failed to replace existing file: {}", target.display()))?;
                fs::rename(&temp, target).await.context(format!(
                    "Swap failed: {} -> {}",
                    temp.display(),
                    target.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!("Swap failed: {} -> {}", temp.display(), target.display()).into(),
                    ),
                });
            }
        }

        if let Some(parent) = target.parent() {
            sync_dir(parent).await;
        }

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn save(&self, key: &StorageKey, body: Bytes) -> Result<StorageLocation, StorageError> {
        let target = self.resolve(key.as_str())?;
        self.write_atomic(&target, &body).await?;

        debug!(path = %target.display(), size = body.len(), "Document saved");
        Ok(StorageLocation::Local(target))
    }

    async fn retrieve(&self, reference: &str) -> Result<Retrieved, StorageError> {
        let candidate = Path::new(reference);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.resolve(candidate)?
        };

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(path.display().to_string()));
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", path.display()).into()),
                });
            },
        };

        let document = parse_document(&data, &path.display().to_string())?;

        let meta = fs::metadata(&path)
            .await
            .context(format!("Failed to get metadata: {}", path.display()))?;
        let modified = meta.modified().context("Filesystem does not report mtime")?;

        debug!(path = %path.display(), "Document retrieved");
        Ok(Retrieved {
            document,
            metadata: ObjectMetadata {
                last_modified: time::iso_naive(&time::system_time_local(modified)),
                size: meta.len(),
            },
        })
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ListingItem>, StorageError> {
        let category = query.validated_category()?;
        let window = query.date_window()?;
        let limit = query.effective_limit();

        let root = self.root.clone();
        let dir = category.as_ref().map_or_else(|| root.clone(), |c| root.join(c.as_str()));

        let items = tokio::task::spawn_blocking(move || walk(&root, &dir, &window, limit))
            .await
            .context("Directory walk task panicked")??;

        debug!(count = items.len(), category = ?query.category, "Local listing complete");
        Ok(items)
    }
}

/// Collects up to `limit` documents below `dir`, in filesystem enumeration order.
fn walk(
    root: &Path,
    dir: &Path,
    window: &DateWindow,
    limit: usize,
) -> Result<Vec<ListingItem>, StorageError> {
    let mut items = Vec::new();

    if limit == 0 || !dir.is_dir() {
        return Ok(items);
    }

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| StorageError::Io {
            source: e.into(),
            context: Some(format!("Failed to walk {}", dir.display()).into()),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_str().is_some_and(|p| p.ends_with(DOCUMENT_SUFFIX)) {
            continue;
        }

        let meta = entry.metadata().map_err(|e| StorageError::Io {
            source: e.into(),
            context: Some(format!("Failed to stat {}", path.display()).into()),
        })?;
        let modified = time::system_time_local(
            meta.modified().context(format!("No mtime for {}", path.display()))?,
        );

        if !window.contains(&modified) {
            continue;
        }

        let Some(key) = security::relative_key(root, path) else {
            warn!(path = %path.display(), "Skipping document with a non UTF-8 path");
            continue;
        };

        items.push(ListingItem {
            key: StorageKey::from_listing(key),
            location: StorageLocation::Local(path.to_path_buf()),
            last_modified: time::iso_naive(&modified),
            size: meta.len(),
        });

        if items.len() >= limit {
            break;
        }
    }

    Ok(items)
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("document");
    target.with_file_name(format!("{file_name}{}{counter}", maintenance::TMP_MARKER))
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}
