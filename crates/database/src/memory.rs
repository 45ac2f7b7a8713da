//! In-process implementations of the store contracts.
//!
//! They back the test suites of every crate above this one and follow the same
//! semantics as the PostgreSQL adapter, including the one-record-per-key upsert
//! on cache creation and the all-or-nothing batch upsert.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::DbError;
use crate::store::{
    CacheKey, CacheRecord, CacheRecordUpdate, CacheStore, NewCacheRecord, Record, RecordFilter,
    RecordStore, SortOrder,
};

#[derive(Debug, Default)]
pub struct InMemoryRecordStore<R> {
    records: RwLock<HashMap<Uuid, R>>,
}

impl<R: Record> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        let records = records.into_iter().map(|r| (r.id(), r)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for InMemoryRecordStore<R> {
    async fn filter(&self, filter: &RecordFilter) -> Result<Vec<R>, DbError> {
        let records = self.records.read().await;
        let mut matched: Vec<R> = records
            .values()
            .filter(|record| filter.matches(*record))
            .cloned()
            .collect();

        // Ties on the date are broken by id so the order is stable across calls.
        matched.sort_by_key(|record| (record.date_key(), record.id()));
        if filter.order == SortOrder::Descending {
            matched.reverse();
        }
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn create(&self, record: R) -> Result<R, DbError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id()) {
            return Err(DbError::InvalidData(format!(
                "record {} already exists",
                record.id()
            )));
        }
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, record: R) -> Result<R, DbError> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(DbError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    records: RwLock<HashMap<CacheKey, CacheRecord>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn find(&self, key: &CacheKey) -> Result<Option<CacheRecord>, DbError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn create(&self, record: NewCacheRecord) -> Result<CacheRecord, DbError> {
        let mut records = self.records.write().await;
        Ok(upsert(&mut records, record))
    }

    async fn update(&self, id: Uuid, update: CacheRecordUpdate) -> Result<CacheRecord, DbError> {
        let mut records = self.records.write().await;
        let record = records
            .values_mut()
            .find(|record| record.id == id)
            .ok_or(DbError::NotFound)?;
        update.apply_to(record);
        Ok(record.clone())
    }

    async fn upsert_many(&self, batch: Vec<NewCacheRecord>) -> Result<Vec<CacheRecord>, DbError> {
        // One write guard for the whole batch, so readers never see half of it.
        let mut records = self.records.write().await;
        Ok(batch
            .into_iter()
            .map(|record| upsert(&mut records, record))
            .collect())
    }
}

fn upsert(records: &mut HashMap<CacheKey, CacheRecord>, record: NewCacheRecord) -> CacheRecord {
    match records.get_mut(&record.key) {
        Some(existing) => {
            CacheRecordUpdate {
                computed: record.computed,
                updated_at: record.updated_at,
            }
            .apply_to(existing);
            existing.clone()
        }
        None => {
            let created = record.into_record(Uuid::new_v4());
            records.insert(created.key, created.clone());
            created
        }
    }
}
