use super::maintenance;
use super::{LocalBackend, LocalInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct LocalBackendBuilder<S: Sealed = NoRoot> {
    state: S,
    create: bool,
    purge: bool,
}

impl Default for LocalBackendBuilder<NoRoot> {
    fn default() -> Self {
        Self { state: NoRoot, create: true, purge: true }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> LocalBackendBuilder<S> {
    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }

    #[must_use = "Sets whether abandoned temp files are purged on connect"]
    pub const fn purge_stale(mut self, enable: bool) -> Self {
        self.purge = enable;
        self
    }
}

impl LocalBackendBuilder<NoRoot> {
    #[must_use = "Creates a new local backend builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory of the local backend"]
    pub fn root(self, path: impl Into<PathBuf>) -> LocalBackendBuilder<WithRoot> {
        LocalBackendBuilder { state: WithRoot(path.into()), create: self.create, purge: self.purge }
    }
}

impl LocalBackendBuilder<WithRoot> {
    /// Consumes the configuration and opens the local backend.
    ///
    /// 1. Creates the root directory when `create(true)` (the default).
    /// 2. Canonicalizes the root so returned locations are absolute.
    /// 3. Purges abandoned temp files when `purge_stale(true)` (the default). Purge failures
    ///    are logged, never fatal.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root cannot be created or resolved.
    pub async fn connect(self) -> Result<LocalBackend, StorageError> {
        let root = &self.state.0;

        if self.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;

        info!(root = %canonical.display(), "Local storage backend ready");

        if self.purge {
            maintenance::purge_tmp(&canonical).await;
        }

        Ok(LocalBackend {
            inner: Arc::new(LocalInner { root: canonical, tmp_counter: AtomicU64::new(1) }),
        })
    }
}
