//! Document storage over two interchangeable media.
//!
//! Callers hand over JSON objects and get back a location; the same contract works whether the
//! bytes end up in a local directory tree or in an object store bucket.
//!
//! # Core Features
//!
//! - **Time-partitioned keys**: `{category}/{YYYY}/{MM}/{DD}/{uuid}.json`, collision resistant
//!   without consulting the backend.
//! - **Atomic local writes**: unique temp write + `fsync` + `rename`, with abandoned temp files
//!   purged on connect.
//! - **Sandboxed local paths**: relative keys can never escape the storage root.
//! - **Object store driver**: Amazon S3 and S3-compatible endpoints via [`object_store`], plus an
//!   in-memory bucket set for development and tests.
//! - **Uniform envelopes**: every manager operation answers with an [`Envelope`] instead of an
//!   error, tagged with an [`ErrorKind`] on failure.
//!
//! # Architectural Overview
//!
//! 1.  **[`StorageManager`]**: the entry point. Routes calls to a driver and shapes results.
//! 2.  **[`StorageBackend`]**: the driver seam, implemented by [`LocalBackend`] and
//!     [`ObjectBackend`].
//! 3.  **[`StorageKey`]**: generates and validates document keys.
//!
//! # Examples
//!
//! ```rust
//! use quire_storage::{BackendKind, ListQuery, LocalBackend, StorageError, StorageManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("storage");
//!     let manager = StorageManager::builder()
//!         .local(LocalBackend::builder().root(&root).connect().await?)
//!         .default_backend(BackendKind::Local)
//!         .build()?;
//!
//!     let document = serde_json::json!({"title": "Release notes"});
//!     let saved = manager
//!         .save(document.as_object().cloned().unwrap_or_default(), "blog")
//!         .await
//!         .into_result()
//!         .expect("saved");
//!
//!     let read = manager.retrieve(saved.metadata.filepath.as_str(), None).await;
//!     assert!(read.is_success());
//!
//!     let listing = manager.list(&ListQuery::new().category("blog")).await;
//!     assert_eq!(listing.into_result().map(|l| l.count).ok(), Some(1));
//!     Ok(())
//! }
//! ```

mod backend;
mod document;
mod envelope;
mod error;
mod key;
mod location;
mod manager;
mod query;
mod time;

pub use backend::local::{LocalBackend, LocalBackendBuilder};
pub use backend::object::{BucketConnector, MemoryConnector, ObjectBackend, S3Connector, S3Options};
pub use backend::{BackendKind, Retrieved, StorageBackend};
pub use document::{Document, METADATA_FIELD, METADATA_VERSION, StorageMetadata};
pub use envelope::{
    Envelope, Failure, ListResult, Listing, RetrieveResult, RetrievedDocument, SaveResult, Saved,
};
pub use error::{ErrorKind, StorageError, StorageErrorExt};
pub use key::{Category, DOCUMENT_SUFFIX, StorageKey};
pub use location::{
    GENERIC_OBJECT_SCHEME, OBJECT_SCHEME, StorageLocation, is_object_reference,
    parse_object_reference,
};
pub use manager::{ManagerInner, StorageManager, StorageManagerBuilder};
pub use query::{
    DEFAULT_LIST_LIMIT, DateFilter, DateWindow, ListQuery, ListingItem, MAX_LIST_LIMIT,
    ObjectMetadata,
};
