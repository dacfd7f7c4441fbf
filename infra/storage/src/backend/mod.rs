//! The driver seam: one trait, two media.
//!
//! Application code talks to [`crate::StorageManager`]; the manager talks to a
//! [`StorageBackend`]. Drivers never shape envelopes or swallow errors, they return
//! [`StorageError`] and let the manager decide how failures are reported.

pub(crate) mod local;
pub(crate) mod object;

use crate::document::Document;
use crate::error::StorageError;
use crate::key::StorageKey;
use crate::location::StorageLocation;
use crate::query::{ListQuery, ListingItem, ObjectMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which physical medium a driver persists to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    #[serde(alias = "s3")]
    Object,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document read back from a backend together with its storage facts.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    pub document: Document,
    pub metadata: ObjectMetadata,
}

/// Save/retrieve/list against one physical storage medium.
#[async_trait]
pub trait StorageBackend: fmt::Debug + Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Writes `body` under `key`, replacing any existing document.
    async fn save(&self, key: &StorageKey, body: Bytes) -> Result<StorageLocation, StorageError>;

    /// Reads and parses the document addressed by `reference`.
    ///
    /// The accepted reference forms are driver specific: the local driver takes relative keys
    /// or absolute paths, the object driver takes bare keys or qualified `s3://` references.
    async fn retrieve(&self, reference: &str) -> Result<Retrieved, StorageError>;

    /// Enumerates stored documents, honouring as much of `query` as the medium supports.
    async fn list(&self, query: &ListQuery) -> Result<Vec<ListingItem>, StorageError>;
}

pub(crate) fn parse_document(bytes: &[u8], origin: &str) -> Result<Document, StorageError> {
    serde_json::from_slice::<Document>(bytes).map_err(|source| StorageError::Corrupt {
        source,
        context: Some(format!("Failed to parse {origin}").into()),
    })
}
