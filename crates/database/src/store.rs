//! The storage contracts the statistics core consumes.
//!
//! Each record family gets its own typed `RecordStore`, and cached statistics go
//! through `CacheStore`. Both are implemented by the PostgreSQL `DbRepository` and
//! by the in-memory stores in [`crate::memory`].

use analytics::PeriodStats;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use core_types::{EntryStatus, EquityPoint, JournalEntry, Period, TradeEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DbError;

/// A stored record that belongs to one user's account and is ordered by a date.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn user_id(&self) -> Uuid;
    fn account_id(&self) -> Uuid;
    /// The date used for ordering and period filtering.
    fn date_key(&self) -> NaiveDate;
    /// Lifecycle status, for record families that have one.
    fn status(&self) -> Option<EntryStatus> {
        None
    }
}

impl Record for JournalEntry {
    fn id(&self) -> Uuid {
        self.id
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn account_id(&self) -> Uuid {
        self.account_id
    }
    fn date_key(&self) -> NaiveDate {
        self.entry_date
    }
    fn status(&self) -> Option<EntryStatus> {
        Some(self.status)
    }
}

impl Record for TradeEntry {
    fn id(&self) -> Uuid {
        self.id
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn account_id(&self) -> Uuid {
        self.account_id
    }
    fn date_key(&self) -> NaiveDate {
        self.date_key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Equality filter over one account's records. Range filtering is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter {
    pub user_id: Uuid,
    pub account_id: Uuid,
    /// Only applies to record families that carry a status.
    pub status: Option<EntryStatus>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn owned_by(user_id: Uuid, account_id: Uuid) -> Self {
        Self {
            user_id,
            account_id,
            status: None,
            order: SortOrder::Ascending,
            limit: None,
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        record.user_id() == self.user_id
            && record.account_id() == self.account_id
            && match (self.status, record.status()) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            }
    }
}

/// Typed read/write access to one record family.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Returns the matching records sorted by their date key.
    async fn filter(&self, filter: &RecordFilter) -> Result<Vec<R>, DbError>;

    async fn create(&self, record: R) -> Result<R, DbError>;

    /// Replaces the stored record with the given id. Fails with `NotFound` if absent.
    async fn update(&self, id: Uuid, record: R) -> Result<R, DbError>;
}

/// Identity of a cached statistics value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub period: Period,
}

impl CacheKey {
    pub fn new(user_id: Uuid, account_id: Uuid, period: Period) -> Self {
        Self {
            user_id,
            account_id,
            period,
        }
    }
}

/// The persisted form of one cached `PeriodStats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub key: CacheKey,
    pub computed: PeriodStats,
    pub equity_curve_snapshot: Vec<EquityPoint>,
    /// When `computed` was produced.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCacheRecord {
    pub key: CacheKey,
    pub computed: PeriodStats,
    pub updated_at: DateTime<Utc>,
}

/// Replacement content for an existing cache record. The key never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecordUpdate {
    pub computed: PeriodStats,
    pub updated_at: DateTime<Utc>,
}

impl NewCacheRecord {
    pub fn into_record(self, id: Uuid) -> CacheRecord {
        CacheRecord {
            id,
            key: self.key,
            equity_curve_snapshot: self.computed.equity_curve.clone(),
            computed: self.computed,
            updated_at: self.updated_at,
        }
    }
}

impl CacheRecordUpdate {
    pub fn apply_to(self, record: &mut CacheRecord) {
        record.equity_curve_snapshot = self.computed.equity_curve.clone();
        record.computed = self.computed;
        record.updated_at = self.updated_at;
    }
}

/// Storage for cached statistics, at most one record per `CacheKey`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn find(&self, key: &CacheKey) -> Result<Option<CacheRecord>, DbError>;

    /// Stores a new record. If a record for the key appeared concurrently it is
    /// replaced, so the one-record-per-key invariant holds under races.
    async fn create(&self, record: NewCacheRecord) -> Result<CacheRecord, DbError>;

    async fn update(&self, id: Uuid, update: CacheRecordUpdate) -> Result<CacheRecord, DbError>;

    /// Creates or replaces one record per key as a single unit. Either every
    /// record is written or, on error, none of them is.
    async fn upsert_many(&self, records: Vec<NewCacheRecord>) -> Result<Vec<CacheRecord>, DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn status_filter_only_applies_to_records_with_a_status() {
        let user = Uuid::new_v4();
        let account = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let filter = RecordFilter::owned_by(user, account).with_status(EntryStatus::Complete);

        let complete = JournalEntry::new(user, account, day, Decimal::ONE, 1, 1, 0);
        let draft = complete.clone().with_status(EntryStatus::Draft);
        let trade = TradeEntry::new(user, account, day, Decimal::ONE);
        let foreign = TradeEntry::new(Uuid::new_v4(), account, day, Decimal::ONE);

        assert!(filter.matches(&complete));
        assert!(!filter.matches(&draft));
        assert!(filter.matches(&trade));
        assert!(!filter.matches(&foreign));
    }
}
