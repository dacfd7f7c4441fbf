//! Time-partitioned key generation for new documents.
//!
//! Keys look like `{category}/{YYYY}/{MM}/{DD}/{uuid}.json`. Generation never touches a
//! backend: uniqueness rests on the 128-bit random identifier alone.

use crate::error::StorageError;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// File suffix shared by every stored document.
pub const DOCUMENT_SUFFIX: &str = ".json";

const MAX_CATEGORY_LEN: usize = 128;

/// A validated category label used as the first key segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Category {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        if value.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "EMPTY".into(),
                context: Some("Category cannot be empty".into()),
            });
        }

        if value.len() > MAX_CATEGORY_LEN {
            return Err(StorageError::InvalidInput {
                message: format!("{} bytes", value.len()).into(),
                context: Some("Category is too long".into()),
            });
        }

        if value == "." || value == ".." {
            return Err(StorageError::InvalidInput {
                message: value.to_owned().into(),
                context: Some("Category cannot be a relative path segment".into()),
            });
        }

        if !value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
            return Err(StorageError::InvalidInput {
                message: value.to_owned().into(),
                context: Some("Category contains illegal characters".into()),
            });
        }

        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Category {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative path identifying a document inside a backend namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Builds a key from its parts. Deterministic for a given date and identifier.
    #[must_use]
    pub fn generate_at(category: &Category, date: NaiveDate, id: Uuid) -> Self {
        Self(format!(
            "{category}/{:04}/{:02}/{:02}/{}{DOCUMENT_SUFFIX}",
            date.year(),
            date.month(),
            date.day(),
            id.hyphenated()
        ))
    }

    /// Builds a key for today's local date with a fresh random identifier.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidInput`] if the category is malformed.
    pub fn generate(category: &str) -> Result<Self, StorageError> {
        let category = Category::try_from(category)?;
        Ok(Self::generate_at(&category, Local::now().date_naive(), Uuid::new_v4()))
    }

    /// Wraps a key enumerated from an existing backend namespace.
    pub(crate) const fn from_listing(raw: String) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First path segment of the key.
    #[must_use]
    pub fn category(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_generate_at_layout() {
        let category = Category::try_from("blog").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);

        let key = StorageKey::generate_at(&category, date, id);
        assert_eq!(key.as_str(), "blog/2024/01/09/01234567-89ab-cdef-0123-456789abcdef.json");
        assert_eq!(key.category(), "blog");
    }

    #[test]
    fn test_generate_at_is_deterministic() {
        let category = Category::try_from("social").unwrap();
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let id = Uuid::new_v4();
        assert_eq!(
            StorageKey::generate_at(&category, date, id),
            StorageKey::generate_at(&category, date, id)
        );
    }

    #[test]
    fn test_rejects_malformed_categories() {
        for bad in ["", ".", "..", "a/b", "a\\b", "white space", "caf\u{e9}"] {
            let err = StorageKey::generate(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "category {bad:?}");
        }
    }

    #[test]
    fn test_accepts_dotted_and_dashed_categories() {
        assert!(StorageKey::generate("press-release_v2.1").is_ok());
    }
}
