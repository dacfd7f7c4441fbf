use crate::backend::local::LocalBackend;
use crate::backend::object::ObjectBackend;
use crate::backend::{BackendKind, StorageBackend};
use crate::document::{Document, StorageMetadata};
use crate::envelope::{
    Envelope, ListResult, Listing, RetrieveResult, RetrievedDocument, SaveResult, Saved,
};
use crate::error::{StorageError, StorageErrorExt};
use crate::key::StorageKey;
use crate::location::is_object_reference;
use crate::query::ListQuery;
use crate::time;
use bytes::Bytes;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared state of a [`StorageManager`].
#[derive(Debug)]
pub struct ManagerInner {
    local: Option<Arc<dyn StorageBackend>>,
    object: Option<Arc<dyn StorageBackend>>,
    default: BackendKind,
}

/// Single entry point over the configured backends.
///
/// Saves and listings always go to the default backend. Reads pick a backend per call, see
/// [`StorageManager::retrieve`]. Failures never escape as `Err`: every operation answers with an
/// [`Envelope`] and logs the underlying error.
///
/// ```rust
/// use quire_storage::{BackendKind, ListQuery, ObjectBackend, StorageManager};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), quire_storage::StorageError> {
/// let manager = StorageManager::builder()
///     .object(ObjectBackend::in_memory("docs"))
///     .default_backend(BackendKind::Object)
///     .build()?;
///
/// let document = serde_json::json!({"title": "Hi"}).as_object().cloned().unwrap_or_default();
/// let saved = manager.save(document, "blog").await;
/// assert!(saved.is_success());
///
/// let listing = manager.list(&ListQuery::new().category("blog")).await;
/// assert_eq!(listing.into_result().map(|l| l.count).ok(), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StorageManager {
    inner: Arc<ManagerInner>,
}

impl Deref for StorageManager {
    type Target = ManagerInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl StorageManager {
    #[must_use = "The manager is not created until you call .build()"]
    pub fn builder() -> StorageManagerBuilder {
        StorageManagerBuilder::default()
    }

    #[must_use]
    pub fn default_backend(&self) -> BackendKind {
        self.default
    }

    /// Backend a read of `reference` is routed to.
    ///
    /// An explicit override wins (`true` selects the object store, `false` the local tree).
    /// Without one, `s3://` and `store://` references go to the object store and anything else
    /// goes to the default backend.
    #[must_use]
    pub fn route(&self, reference: &str, is_ref: Option<bool>) -> BackendKind {
        match is_ref {
            Some(true) => BackendKind::Object,
            Some(false) => BackendKind::Local,
            None if is_object_reference(reference) => BackendKind::Object,
            None => self.default,
        }
    }

    fn backend(&self, kind: BackendKind) -> Result<&Arc<dyn StorageBackend>, StorageError> {
        let slot = match kind {
            BackendKind::Local => &self.local,
            BackendKind::Object => &self.object,
        };
        slot.as_ref().ok_or_else(|| StorageError::BackendMissing {
            message: kind.as_str().into(),
            context: Some("No such backend is configured".into()),
        })
    }

    /// Stamps `document` with [`StorageMetadata`] and persists it under a fresh key in
    /// `category` on the default backend.
    pub async fn save(&self, document: Document, category: &str) -> SaveResult {
        report("save", self.try_save(document, category).await)
    }

    /// Reads a document by key, absolute local path, or object reference.
    pub async fn retrieve(&self, reference: &str, is_ref: Option<bool>) -> RetrieveResult {
        report("retrieve", self.try_retrieve(reference, is_ref).await)
    }

    /// Lists documents on the default backend.
    pub async fn list(&self, query: &ListQuery) -> ListResult {
        report("list", self.try_list(query).await)
    }

    async fn try_save(&self, document: Document, category: &str) -> Result<Saved, StorageError> {
        if document.is_empty() {
            return Err(StorageError::invalid("Content data is required"));
        }

        let backend = self.backend(self.default)?;
        let key = StorageKey::generate(category)?;
        let metadata = StorageMetadata::new(key.clone(), time::now_iso());

        let body = serde_json::to_vec_pretty(&metadata.stamp(document))
            .context(format!("Failed to serialize document {key}"))?;
        let location = backend.save(&key, Bytes::from(body)).await?;

        info!(backend = %self.default, %location, "Document stored");
        Ok(Saved { storage_type: self.default, location, metadata })
    }

    async fn try_retrieve(
        &self,
        reference: &str,
        is_ref: Option<bool>,
    ) -> Result<RetrievedDocument, StorageError> {
        if reference.is_empty() {
            return Err(StorageError::invalid("Document reference is empty"));
        }

        let kind = self.route(reference, is_ref);
        debug!(reference, backend = %kind, "Routing retrieval");

        let retrieved = self.backend(kind)?.retrieve(reference).await?;
        Ok(RetrievedDocument { content: retrieved.document, metadata: retrieved.metadata })
    }

    async fn try_list(&self, query: &ListQuery) -> Result<Listing, StorageError> {
        let items = self.backend(self.default)?.list(query).await?;
        Ok(Listing::from(items))
    }
}

fn report<T>(operation: &'static str, result: Result<T, StorageError>) -> Envelope<T> {
    if let Err(err) = &result {
        error!(operation, kind = ?err.kind(), error = %err, "Storage operation failed");
    }
    result.into()
}

/// Assembles a [`StorageManager`] from the backends that are actually available.
#[derive(Debug, Default)]
pub struct StorageManagerBuilder {
    local: Option<Arc<dyn StorageBackend>>,
    object: Option<Arc<dyn StorageBackend>>,
    default: BackendKind,
}

impl StorageManagerBuilder {
    #[must_use = "Registers the local filesystem backend"]
    pub fn local(self, backend: LocalBackend) -> Self {
        self.backend(Arc::new(backend))
    }

    #[must_use = "Registers the object store backend"]
    pub fn object(self, backend: ObjectBackend) -> Self {
        self.backend(Arc::new(backend))
    }

    /// Registers any driver in the slot matching its [`StorageBackend::kind`].
    #[must_use = "Registers a storage backend"]
    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        match backend.kind() {
            BackendKind::Local => self.local = Some(backend),
            BackendKind::Object => self.object = Some(backend),
        }
        self
    }

    #[must_use = "Sets the backend used for saves and listings"]
    pub const fn default_backend(mut self, kind: BackendKind) -> Self {
        self.default = kind;
        self
    }

    /// # Errors
    /// Returns [`StorageError::BackendMissing`] if the default backend was not registered.
    pub fn build(self) -> Result<StorageManager, StorageError> {
        let registered = match self.default {
            BackendKind::Local => self.local.is_some(),
            BackendKind::Object => self.object.is_some(),
        };
        if !registered {
            return Err(StorageError::BackendMissing {
                message: self.default.as_str().into(),
                context: Some("The default backend must be registered".into()),
            });
        }

        info!(
            default = %self.default,
            local = self.local.is_some(),
            object = self.object.is_some(),
            "Storage manager ready"
        );

        Ok(StorageManager {
            inner: Arc::new(ManagerInner {
                local: self.local,
                object: self.object,
                default: self.default,
            }),
        })
    }
}
