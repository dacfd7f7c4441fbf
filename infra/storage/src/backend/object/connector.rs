use crate::error::StorageError;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Opens an object store handle for a bucket name.
///
/// The object driver reads from arbitrary buckets when handed a qualified reference, so it
/// needs a factory rather than a single handle.
pub trait BucketConnector: fmt::Debug + Send + Sync {
    /// # Errors
    /// Returns [`StorageError::ObjectStore`] if the client for `bucket` cannot be built.
    fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError>;
}

/// Client options for Amazon S3 and S3-compatible endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Options {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

/// Connects to S3 buckets, reusing one client per bucket.
///
/// Credentials come from the standard `AWS_*` environment variables.
#[derive(Default)]
pub struct S3Connector {
    options: S3Options,
    clients: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Connector {
    #[must_use]
    pub fn new(options: S3Options) -> Self {
        Self { options, clients: RwLock::default() }
    }

    fn build(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        if let Some(region) = &self.options.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &self.options.endpoint {
            builder = builder.with_endpoint(endpoint).with_virtual_hosted_style_request(false);
        }
        builder = builder.with_allow_http(self.options.allow_http);

        let client = builder.build().map_err(|source| StorageError::ObjectStore {
            source,
            context: Some(format!("Failed to build S3 client for bucket '{bucket}'").into()),
        })?;

        debug!(bucket, endpoint = ?self.options.endpoint, "S3 client created");
        Ok(Arc::new(client))
    }
}

impl fmt::Debug for S3Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Connector")
            .field("options", &self.options)
            .field("clients", &self.clients.read().len())
            .finish()
    }
}

impl BucketConnector for S3Connector {
    fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        if let Some(client) = self.clients.read().get(bucket) {
            return Ok(Arc::clone(client));
        }

        let client = self.build(bucket)?;
        let mut clients = self.clients.write();
        Ok(Arc::clone(clients.entry(bucket.to_owned()).or_insert(client)))
    }
}

/// Process-local buckets backed by [`InMemory`] stores, created on first use.
///
/// Lets the service run without any external storage and backs the object driver's tests.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct handle on a bucket, e.g. to seed fixtures.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Arc<InMemory> {
        if let Some(store) = self.buckets.read().get(name) {
            return Arc::clone(store);
        }
        let mut buckets = self.buckets.write();
        Arc::clone(buckets.entry(name.to_owned()).or_insert_with(|| Arc::new(InMemory::new())))
    }
}

impl BucketConnector for MemoryConnector {
    fn connect(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        Ok(self.bucket(bucket))
    }
}
