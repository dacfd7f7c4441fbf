use crate::error::StorageError;
use crate::key::{Category, StorageKey};
use crate::location::StorageLocation;
use crate::time;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Listing size used when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Upper bound on a single listing, regardless of the requested limit.
pub const MAX_LIST_LIMIT: usize = 1000;

/// How date bounds are compared against item timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    /// ISO strings are compared byte-wise; bounds must be zero-padded to filter correctly.
    ///
    /// Stamps omit the fraction when microseconds are zero, so an end bound of
    /// `2024-01-10T12:00:00` includes a file modified at exactly noon but excludes one
    /// modified a microsecond later.
    #[default]
    Lexical,
    /// Bounds and timestamps are parsed and compared as datetimes.
    Parsed,
}

/// Parameters of a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: usize,
    pub date_filter: DateFilter,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            category: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_LIST_LIMIT,
            date_filter: DateFilter::Lexical,
        }
    }
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn start_date(mut self, start: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    #[must_use]
    pub fn end_date(mut self, end: impl Into<String>) -> Self {
        self.end_date = Some(end.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn date_filter(mut self, mode: DateFilter) -> Self {
        self.date_filter = mode;
        self
    }

    /// Requested limit clamped to [`MAX_LIST_LIMIT`].
    #[must_use]
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_LIST_LIMIT)
    }

    /// Validated category, if one was given.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidInput`] for malformed categories.
    pub fn validated_category(&self) -> Result<Option<Category>, StorageError> {
        self.category.as_deref().map(Category::try_from).transpose()
    }

    /// Compiles the date bounds into a reusable predicate.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidInput`] when [`DateFilter::Parsed`] is selected and a
    /// bound cannot be parsed.
    pub fn date_window(&self) -> Result<DateWindow, StorageError> {
        match self.date_filter {
            DateFilter::Lexical => Ok(DateWindow::Lexical {
                start: self.start_date.clone(),
                end: self.end_date.clone(),
            }),
            DateFilter::Parsed => Ok(DateWindow::Parsed {
                start: parse(self.start_date.as_deref(), false)?,
                end: parse(self.end_date.as_deref(), true)?,
            }),
        }
    }

    #[must_use]
    pub fn has_date_bounds(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

fn parse(raw: Option<&str>, upper: bool) -> Result<Option<NaiveDateTime>, StorageError> {
    raw.map(|value| {
        time::parse_bound(value, upper).ok_or_else(|| StorageError::InvalidInput {
            message: value.to_owned().into(),
            context: Some("Date bound is not an ISO-8601 date or datetime".into()),
        })
    })
    .transpose()
}

/// Inclusive date window applied by drivers that support date filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateWindow {
    Lexical { start: Option<String>, end: Option<String> },
    Parsed { start: Option<NaiveDateTime>, end: Option<NaiveDateTime> },
}

impl DateWindow {
    #[must_use]
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        match self {
            Self::Lexical { start, end } => {
                let iso = time::iso_naive(timestamp);
                start.as_deref().is_none_or(|s| iso.as_str() >= s)
                    && end.as_deref().is_none_or(|e| iso.as_str() <= e)
            },
            Self::Parsed { start, end } => {
                start.is_none_or(|s| *timestamp >= s) && end.is_none_or(|e| *timestamp <= e)
            },
        }
    }
}

/// Read-only projection of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingItem {
    pub key: StorageKey,
    pub location: StorageLocation,
    pub last_modified: String,
    pub size: u64,
}

/// Backend-reported facts about a retrieved document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    pub last_modified: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(h, 0, 0)).unwrap()
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(ListQuery::new().effective_limit(), DEFAULT_LIST_LIMIT);
        assert_eq!(ListQuery::new().limit(50_000).effective_limit(), MAX_LIST_LIMIT);
        assert_eq!(ListQuery::new().limit(0).effective_limit(), 0);
    }

    #[test]
    fn test_lexical_window_compares_strings() {
        let window = ListQuery::new()
            .start_date("2024-02-01")
            .end_date("2024-02-01T23:59:59")
            .date_window()
            .unwrap();
        assert!(window.contains(&at(2024, 2, 1, 12)));
        assert!(!window.contains(&at(2024, 1, 31, 12)));
        assert!(!window.contains(&at(2024, 2, 2, 0)));
    }

    #[test]
    fn test_lexical_window_misbehaves_on_unpadded_bounds() {
        let window = ListQuery::new().start_date("2024-2-1").date_window().unwrap();
        // "2024-02-..." sorts before "2024-2-1", so a February timestamp is excluded.
        assert!(!window.contains(&at(2024, 2, 15, 0)));
    }

    #[test]
    fn test_lexical_end_bound_on_whole_second() {
        let window = ListQuery::new().end_date("2024-01-10T12:00:00").date_window().unwrap();
        let noon = at(2024, 1, 10, 12);
        assert!(window.contains(&noon));
        assert!(!window.contains(&(noon + chrono::TimeDelta::microseconds(1))));
    }

    #[test]
    fn test_date_filter_names() {
        let parsed: DateFilter = serde_json::from_str("\"parsed\"").unwrap();
        assert_eq!(parsed, DateFilter::Parsed);
        assert!(serde_json::from_str::<DateFilter>("\"fuzzy\"").is_err());
    }

    #[test]
    fn test_parsed_window_covers_whole_end_day() {
        let window = ListQuery::new()
            .start_date("2024-02-01")
            .end_date("2024-02-01")
            .date_filter(DateFilter::Parsed)
            .date_window()
            .unwrap();
        assert!(window.contains(&at(2024, 2, 1, 23)));
        assert!(!window.contains(&at(2024, 2, 2, 0)));
    }

    #[test]
    fn test_parsed_window_rejects_garbage() {
        let err = ListQuery::new()
            .start_date("yesterday")
            .date_filter(DateFilter::Parsed)
            .date_window()
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }
}
