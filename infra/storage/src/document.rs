use crate::key::StorageKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied document: a flat JSON object.
pub type Document = Map<String, Value>;

/// Reserved top-level field carrying [`StorageMetadata`].
pub const METADATA_FIELD: &str = "storage_metadata";

/// Current layout version stamped into every saved document.
pub const METADATA_VERSION: &str = "1.0";

/// Bookkeeping block injected into every saved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMetadata {
    pub filepath: StorageKey,
    pub timestamp: String,
    pub version: String,
}

impl StorageMetadata {
    #[must_use]
    pub fn new(filepath: StorageKey, timestamp: String) -> Self {
        Self { filepath, timestamp, version: METADATA_VERSION.to_owned() }
    }

    /// Merges the metadata into `document`, replacing any caller value under the reserved field.
    #[must_use]
    pub fn stamp(&self, mut document: Document) -> Document {
        let block = serde_json::json!({
            "filepath": self.filepath.as_str(),
            "timestamp": self.timestamp,
            "version": self.version,
        });
        document.insert(METADATA_FIELD.to_owned(), block);
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> StorageKey {
        StorageKey::generate("blog").unwrap()
    }

    #[test]
    fn test_stamp_keeps_caller_fields() {
        let meta = StorageMetadata::new(key(), "2024-01-01T00:00:00.000000".into());
        let doc = json!({"title": "Hello", "tags": ["a"]}).as_object().cloned().unwrap();

        let stamped = meta.stamp(doc);
        assert_eq!(stamped["title"], "Hello");
        assert_eq!(stamped["tags"], json!(["a"]));
        assert_eq!(stamped[METADATA_FIELD]["version"], METADATA_VERSION);
        assert_eq!(stamped[METADATA_FIELD]["filepath"], meta.filepath.as_str());
    }

    #[test]
    fn test_stamp_overwrites_reserved_field() {
        let meta = StorageMetadata::new(key(), "2024-01-01T00:00:00.000000".into());
        let doc = json!({"storage_metadata": "forged"}).as_object().cloned().unwrap();

        let stamped = meta.stamp(doc);
        assert_eq!(stamped.len(), 1);
        assert_eq!(stamped[METADATA_FIELD]["timestamp"], "2024-01-01T00:00:00.000000");
    }
}
