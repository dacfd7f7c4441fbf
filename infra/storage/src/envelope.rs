//! Uniform result shapes returned by [`crate::StorageManager`].
//!
//! Every operation answers with an [`Envelope`] serialized as a JSON object carrying a
//! `status` discriminator (`"success"` or `"error"`) next to the payload fields.

use crate::backend::BackendKind;
use crate::document::{Document, StorageMetadata};
use crate::error::{ErrorKind, StorageError};
use crate::location::StorageLocation;
use crate::query::{ListingItem, ObjectMetadata};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success(T),
    Error(Failure),
}

/// Payload of an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub error: String,
    pub kind: ErrorKind,
}

impl From<&StorageError> for Failure {
    fn from(err: &StorageError) -> Self {
        Self { error: err.to_string(), kind: err.kind() }
    }
}

impl<T> Envelope<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Error(failure) => Some(failure),
        }
    }

    /// Converts into a plain [`Result`], e.g. to use `?` in callers that prefer it.
    ///
    /// # Errors
    /// Returns the [`Failure`] payload of an error envelope.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Error(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, StorageError>> for Envelope<T> {
    fn from(result: Result<T, StorageError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Error(Failure::from(&err)),
        }
    }
}

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Saved {
    pub storage_type: BackendKind,
    pub location: StorageLocation,
    pub metadata: StorageMetadata,
}

/// Outcome of a retrieve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub content: Document,
    pub metadata: ObjectMetadata,
}

/// Outcome of a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub items: Vec<ListingItem>,
    pub count: usize,
}

impl From<Vec<ListingItem>> for Listing {
    fn from(items: Vec<ListingItem>) -> Self {
        Self { count: items.len(), items }
    }
}

pub type SaveResult = Envelope<Saved>;
pub type RetrieveResult = Envelope<RetrievedDocument>;
pub type ListResult = Envelope<Listing>;
