use serde::Serialize;
use std::borrow::Cow;

/// Coarse failure classes surfaced to callers through error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    Corrupt,
    BackendUnavailable,
    InvalidInput,
}

/// A specialized [`StorageError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Stored document is not valid JSON{}: {source}", format_context(.context))]
    Corrupt { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Backend not configured{}: {message}", format_context(.context))]
    BackendMissing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Filesystem I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Object store failure{}: {source}", format_context(.context))]
    ObjectStore { source: object_store::Error, context: Option<Cow<'static, str>> },

    #[error("Background task failure{}: {source}", format_context(.context))]
    Join { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },
}

impl StorageError {
    /// Maps the variant onto the public failure taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::InvalidInput { .. } | Self::PathTraversalAttempt { .. } => {
                ErrorKind::InvalidInput
            },
            Self::BackendMissing { .. }
            | Self::Io { .. }
            | Self::ObjectStore { .. }
            | Self::Join { .. } => ErrorKind::BackendUnavailable,
        }
    }

    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { message: message.into(), context: None }
    }

    pub(crate) fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound { message: message.into(), context: None }
    }
}

pub trait StorageErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError>;
}

impl<T> StorageErrorExt<T> for Result<T, StorageError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                StorageError::NotFound { context: c, .. }
                | StorageError::Corrupt { context: c, .. }
                | StorageError::InvalidInput { context: c, .. }
                | StorageError::PathTraversalAttempt { context: c, .. }
                | StorageError::BackendMissing { context: c, .. }
                | StorageError::Io { context: c, .. }
                | StorageError::ObjectStore { context: c, .. }
                | StorageError::Join { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

macro_rules! source_variant {
    ($source:ty => $variant:ident) => {
        impl From<$source> for StorageError {
            #[inline]
            fn from(source: $source) -> Self {
                Self::$variant { source, context: None }
            }
        }

        impl<T> StorageErrorExt<T> for Result<T, $source> {
            #[inline]
            fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
                self.map_err(|source| StorageError::$variant {
                    source,
                    context: Some(context.into()),
                })
            }
        }
    };
}

source_variant!(serde_json::Error => Corrupt);
source_variant!(std::io::Error => Io);
source_variant!(object_store::Error => ObjectStore);
source_variant!(tokio::task::JoinError => Join);

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered() {
        let err: Result<(), StorageError> = Err(StorageError::not_found("blog/x.json"));
        let err = err.context("Local retrieval").unwrap_err();
        assert_eq!(err.to_string(), "Document not found (Local retrieval): blog/x.json");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_io_maps_to_backend_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::from(io);
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_traversal_is_invalid_input() {
        let err = StorageError::PathTraversalAttempt { message: "../x".into(), context: None };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
