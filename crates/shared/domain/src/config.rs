use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Origins allowed to call the API from a browser. `*` allows any origin.
    pub cors_origins: Vec<String>,
}

/// Medium that receives saves and answers listings.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMedium {
    #[default]
    Local,
    #[serde(alias = "s3")]
    Object,
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Default backend for saves and listings.
    pub backend: StorageMedium,
    /// Root of the local document tree, relative to the working directory unless absolute.
    pub root: PathBuf,
    /// Default object store bucket.
    pub bucket: String,
    pub object: ObjectStoreConfig,
}

/// Object store client selection.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStoreProvider {
    /// Amazon S3 or an S3-compatible endpoint. Credentials come from `AWS_*` variables.
    #[default]
    S3,
    /// Process-local buckets, lost on restart.
    Memory,
}

/// Object store client options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    pub provider: ObjectStoreProvider,
    pub region: String,
    /// Custom endpoint for S3-compatible services (e.g. `MinIO`).
    pub endpoint: Option<String>,
    pub allow_http: bool,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            cors_origins: vec!["*".to_owned()],
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageMedium::default(),
            root: PathBuf::from("storage"),
            bucket: "content-generation-local".to_owned(),
            object: ObjectStoreConfig::default(),
        }
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            provider: ObjectStoreProvider::default(),
            region: "us-east-1".to_owned(),
            endpoint: None,
            allow_http: false,
        }
    }
}
