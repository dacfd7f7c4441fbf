use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Scheme used when rendering object-store locations.
pub const OBJECT_SCHEME: &str = "s3://";

/// Alternate scheme accepted when parsing object-store references.
pub const GENERIC_OBJECT_SCHEME: &str = "store://";

/// Where a document physically lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageLocation {
    /// Absolute path on the local filesystem.
    Local(PathBuf),
    /// Object inside a bucket, rendered as `s3://bucket/key`.
    Object { bucket: String, key: String },
}

impl StorageLocation {
    /// Relative key for object locations, `None` for local paths.
    #[must_use]
    pub fn object_key(&self) -> Option<&str> {
        match self {
            Self::Local(_) => None,
            Self::Object { key, .. } => Some(key),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Object { bucket, key } => write!(f, "{OBJECT_SCHEME}{bucket}/{key}"),
        }
    }
}

impl Serialize for StorageLocation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Splits a fully qualified `s3://bucket/key` (or `store://bucket/key`) reference.
///
/// Returns `None` for anything that is not a qualified reference. A reference with no key
/// part yields an empty key.
#[must_use]
pub fn parse_object_reference(reference: &str) -> Option<(&str, &str)> {
    let rest = reference
        .strip_prefix(OBJECT_SCHEME)
        .or_else(|| reference.strip_prefix(GENERIC_OBJECT_SCHEME))?;
    Some(rest.split_once('/').unwrap_or((rest, "")))
}

/// Whether `reference` looks like a fully qualified object-store reference.
#[must_use]
pub fn is_object_reference(reference: &str) -> bool {
    parse_object_reference(reference).is_some()
}
