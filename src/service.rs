use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    codes::{self, CodeGenerator},
    db::{RecordStore, StoreError},
    diff::diff,
    error::AppError,
    models::{Filter, Patch, Record, UrlRequest},
};

/// Most records returned by [`RecordService::list`].
pub const LIST_LIMIT: usize = 10;

const MAX_CODE_ATTEMPTS: u32 = 5;

/// Outcome of [`RecordService::shorten`].
#[derive(Debug)]
pub enum Shortened {
    Created(Record),
    Existing(Record),
}

impl Shortened {
    pub fn record(&self) -> &Record {
        match self {
            Shortened::Created(record) | Shortened::Existing(record) => record,
        }
    }
}

/// Record lifecycle on top of a [`RecordStore`].
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    codes: CodeGenerator,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_code_generator(store, codes::random())
    }

    pub fn with_code_generator(store: Arc<dyn RecordStore>, codes: CodeGenerator) -> Self {
        Self { store, codes }
    }

    /// Returns the record already holding `request.url`, or creates one
    /// under a fresh short code.
    ///
    /// The store rejects a second record for the same URL, so a concurrent
    /// request that wins the insert is returned as the existing record.
    pub async fn shorten(&self, request: UrlRequest) -> Result<Shortened, AppError> {
        if let Some(existing) = self.find_by_url(&request.url).await? {
            debug!(code = %existing.short_code, "record already exists");
            return Ok(Shortened::Existing(existing));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let mut record = Record::new(request.url.clone(), (self.codes)(), Utc::now());
            match self.store.insert(&record).await {
                Ok(id) => {
                    record.id = id;
                    info!(code = %record.short_code, url = %record.url, "shortened url");
                    return Ok(Shortened::Created(record));
                }
                Err(StoreError::Duplicate) => {
                    if let Some(existing) = self.find_by_url(&request.url).await? {
                        debug!(code = %existing.short_code, "url stored concurrently");
                        return Ok(Shortened::Existing(existing));
                    }
                    warn!(attempt, code = %record.short_code, "short code collision");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::CodeSpaceExhausted)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Record>, AppError> {
        match self.store.find_one(&Filter::by_url(url)).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up `code` and counts the access.
    ///
    /// The increment is a read followed by a separate write, so concurrent
    /// fetches of the same code may lose increments.
    pub async fn fetch(&self, code: &str) -> Result<Record, AppError> {
        let mut record = self.find_by_code(code).await?;

        let patch = Patch::access_count(record.access_count + 1);
        self.store.update_one(&Filter::by_code(code), &patch).await?;
        record.apply(&patch);

        Ok(record)
    }

    pub async fn stats(&self, code: &str) -> Result<Record, AppError> {
        self.find_by_code(code).await
    }

    /// Points `code` at a new URL. Identity fields and the counter are kept,
    /// `updated_at` is refreshed.
    pub async fn replace(&self, code: &str, request: UrlRequest) -> Result<Record, AppError> {
        let old = self.find_by_code(code).await?;

        if request.url != old.url
            && let Some(other) = self.find_by_url(&request.url).await?
            && other.id != old.id
        {
            return Err(AppError::UrlAlreadyExists);
        }

        let new = Record {
            url: request.url,
            updated_at: Utc::now().max(old.created_at),
            ..old.clone()
        };

        let patch = diff(&old, &new)?;
        debug!(code, ?patch, "replacing record");
        self.store.update_one(&Filter::by_code(code), &patch).await?;

        Ok(new)
    }

    pub async fn delete(&self, code: &str) -> Result<(), AppError> {
        self.store.delete_one(&Filter::by_code(code)).await?;
        info!(code, "deleted record");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Record>, AppError> {
        Ok(self.store.find_many(LIST_LIMIT).await?)
    }

    async fn find_by_code(&self, code: &str) -> Result<Record, AppError> {
        Ok(self.store.find_one(&Filter::by_code(code)).await?)
    }
}
