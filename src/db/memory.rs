use async_trait::async_trait;
use parking_lot::RwLock;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{Filter, Patch, Record};

#[derive(Default)]
struct Collection {
    records: Vec<Record>,
    next_id: u64,
}

/// Insertion-ordered store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: &Record) -> StoreResult<String> {
        let mut inner = self.inner.write();

        let key = Filter::by_key(&record.url, &record.short_code);
        if inner.records.iter().any(|stored| key.matches(stored)) {
            return Err(StoreError::Duplicate);
        }

        inner.next_id += 1;
        let id = format!("{:024x}", inner.next_id);

        inner.records.push(Record {
            id: id.clone(),
            ..record.clone()
        });

        Ok(id)
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Record> {
        self.inner
            .read()
            .records
            .iter()
            .find(|record| filter.matches(record))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_one(&self, filter: &Filter, patch: &Patch) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let index = inner
            .records
            .iter()
            .position(|record| filter.matches(record))
            .ok_or(StoreError::NotFound)?;

        let key = Filter {
            url: patch.url.clone(),
            short_code: patch.short_code.clone(),
        };
        let taken = inner
            .records
            .iter()
            .enumerate()
            .any(|(i, other)| i != index && key.matches(other));
        if taken {
            return Err(StoreError::Duplicate);
        }

        inner.records[index].apply(patch);
        Ok(())
    }

    async fn delete_one(&self, filter: &Filter) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let index = inner
            .records
            .iter()
            .position(|record| filter.matches(record))
            .ok_or(StoreError::NotFound)?;

        inner.records.remove(index);
        Ok(())
    }

    async fn find_many(&self, limit: usize) -> StoreResult<Vec<Record>> {
        Ok(self.inner.read().records.iter().take(limit).cloned().collect())
    }
}
