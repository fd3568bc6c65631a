use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Record;

/// Lookup criteria over the natural key.
///
/// A record matches when either present field is non-empty and equal to the
/// record's value. A filter with no usable field matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub url: Option<String>,
    pub short_code: Option<String>,
}

impl Filter {
    pub fn by_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            short_code: None,
        }
    }

    pub fn by_code(short_code: impl Into<String>) -> Self {
        Self {
            url: None,
            short_code: Some(short_code.into()),
        }
    }

    pub fn by_key(url: impl Into<String>, short_code: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            short_code: Some(short_code.into()),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn short_code(&self) -> Option<&str> {
        self.short_code.as_deref().filter(|code| !code.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.url().is_none() && self.short_code().is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.url().is_some_and(|url| url == record.url)
            || self.short_code().is_some_and(|code| code == record.short_code)
    }
}

/// Field assignments applied to a stored record. Absent fields are left as
/// they are; `id` cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_count: Option<i64>,
}

impl Patch {
    pub fn access_count(count: i64) -> Self {
        Self {
            access_count: Some(count),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.short_code.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
            && self.access_count.is_none()
    }
}

impl Record {
    /// Merges the fields present in `patch` into this record.
    pub fn apply(&mut self, patch: &Patch) {
        if let Some(url) = &patch.url {
            self.url = url.clone();
        }
        if let Some(short_code) = &patch.short_code {
            self.short_code = short_code.clone();
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = created_at;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(access_count) = patch.access_count {
            self.access_count = access_count;
        }
    }
}
