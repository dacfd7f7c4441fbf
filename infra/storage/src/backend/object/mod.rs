//! Object-store driver.
//!
//! Documents are single objects keyed by their [`StorageKey`] inside one configured bucket.
//! Reads also accept qualified `s3://bucket/key` references, which may point at any bucket the
//! [`BucketConnector`] can open. Listing is a single prefix scan and does not filter by date.

mod connector;

pub use connector::{BucketConnector, MemoryConnector, S3Connector, S3Options};

use super::{BackendKind, Retrieved, StorageBackend, parse_document};
use crate::error::{StorageError, StorageErrorExt};
use crate::key::StorageKey;
use crate::location::{OBJECT_SCHEME, StorageLocation, parse_object_reference};
use crate::query::{ListQuery, ListingItem, ObjectMetadata};
use crate::time;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectMeta, ObjectStore, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::debug;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Driver persisting documents as objects in a bucket.
#[derive(Debug, Clone)]
pub struct ObjectBackend {
    bucket: Arc<str>,
    connector: Arc<dyn BucketConnector>,
}

impl ObjectBackend {
    #[must_use]
    pub fn new(bucket: impl Into<Arc<str>>, connector: Arc<dyn BucketConnector>) -> Self {
        Self { bucket: bucket.into(), connector }
    }

    /// Driver for an S3 (or S3-compatible) bucket.
    #[must_use]
    pub fn s3(bucket: impl Into<Arc<str>>, options: S3Options) -> Self {
        Self::new(bucket, Arc::new(S3Connector::new(options)))
    }

    /// Driver over process-local in-memory buckets.
    #[must_use]
    pub fn in_memory(bucket: impl Into<Arc<str>>) -> Self {
        Self::new(bucket, Arc::new(MemoryConnector::new()))
    }

    /// Default bucket used for saves, listings and bare-key reads.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        self.connector.connect(bucket)
    }
}

fn object_path(key: &str) -> Result<ObjectPath, StorageError> {
    ObjectPath::parse(key).map_err(|e| StorageError::InvalidInput {
        message: key.to_owned().into(),
        context: Some(format!("Invalid object key: {e}").into()),
    })
}

fn object_metadata(meta: &ObjectMeta) -> ObjectMetadata {
    ObjectMetadata { last_modified: time::iso_utc(&meta.last_modified), size: meta.size }
}

#[async_trait]
impl StorageBackend for ObjectBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Object
    }

    async fn save(&self, key: &StorageKey, body: Bytes) -> Result<StorageLocation, StorageError> {
        let path = object_path(key.as_str())?;
        let store = self.store(&self.bucket)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, JSON_CONTENT_TYPE.into());

        let size = body.len();
        store
            .put_opts(&path, PutPayload::from(body), PutOptions::from(attributes))
            .await
            .context(format!("Put failed: {OBJECT_SCHEME}{}/{key}", self.bucket))?;

        debug!(bucket = %self.bucket, key = %key, size, "Document saved");
        Ok(StorageLocation::Object { bucket: self.bucket.to_string(), key: key.to_string() })
    }

    async fn retrieve(&self, reference: &str) -> Result<Retrieved, StorageError> {
        let (bucket, key) =
            parse_object_reference(reference).unwrap_or((&*self.bucket, reference));

        if bucket.is_empty() || key.is_empty() {
            return Err(StorageError::InvalidInput {
                message: reference.to_owned().into(),
                context: Some("Object reference needs both a bucket and a key".into()),
            });
        }

        let path = object_path(key)?;
        let store = self.store(bucket)?;
        let uri = format!("{OBJECT_SCHEME}{bucket}/{key}");

        let result = match store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::not_found(uri));
            },
            Err(source) => {
                return Err(StorageError::ObjectStore {
                    source,
                    context: Some(format!("Get failed: {uri}").into()),
                });
            },
        };

        let metadata = object_metadata(&result.meta);
        let body = result.bytes().await.context(format!("Body read failed: {uri}"))?;
        let document = parse_document(&body, &uri)?;

        debug!(bucket, key, "Document retrieved");
        Ok(Retrieved { document, metadata })
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<ListingItem>, StorageError> {
        let category = query.validated_category()?;
        let limit = query.effective_limit();

        if query.has_date_bounds() {
            debug!(
                start = ?query.start_date,
                end = ?query.end_date,
                "Date bounds are not applied by the object store backend"
            );
        }

        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefix = category.as_ref().map(|c| ObjectPath::from(c.as_str()));
        let store = self.store(&self.bucket)?;

        let objects = store
            .list(prefix.as_ref())
            .take(limit)
            .try_collect::<Vec<ObjectMeta>>()
            .await
            .context(format!("List failed: {OBJECT_SCHEME}{}", self.bucket))?;

        let items: Vec<ListingItem> = objects
            .iter()
            .map(|meta| {
                let key = meta.location.to_string();
                let metadata = object_metadata(meta);
                ListingItem {
                    location: StorageLocation::Object {
                        bucket: self.bucket.to_string(),
                        key: key.clone(),
                    },
                    key: StorageKey::from_listing(key),
                    last_modified: metadata.last_modified,
                    size: metadata.size,
                }
            })
            .collect();

        debug!(bucket = %self.bucket, count = items.len(), "Object listing complete");
        Ok(items)
    }
}
