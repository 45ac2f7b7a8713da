use crate::clock::{Clock, SystemClock};
use crate::error::StatsCacheError;
use analytics::{PeriodStats, StatsComputer};
use chrono::{DateTime, TimeDelta, Utc};
use configuration::StatsCacheSettings;
use core_types::{EntryStatus, JournalEntry, Period, TradeEntry};
use database::{
    CacheKey, CacheRecord, CacheRecordUpdate, CacheStore, NewCacheRecord, RecordFilter,
    RecordStore,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Whether a cached value would be served as-is by the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    Fresh,
    Stale,
}

/// Diagnostic view of one cache record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    pub period: Period,
    pub state: CacheState,
    pub updated_at: DateTime<Utc>,
    pub age_seconds: i64,
}

/// Serves period statistics from the cache, recomputing them when the stored
/// value is missing or older than the freshness window.
#[derive(Clone)]
pub struct StatsCacheManager {
    // --- Shared Stores ---
    journal_store: Arc<dyn RecordStore<JournalEntry>>,
    trade_store: Arc<dyn RecordStore<TradeEntry>>,
    cache_store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,

    // --- Policy ---
    computer: StatsComputer,
    settings: StatsCacheSettings,
    freshness_window: TimeDelta,
}

impl StatsCacheManager {
    /// Creates a manager backed by the given stores, reading time from the system clock.
    pub fn new(
        journal_store: Arc<dyn RecordStore<JournalEntry>>,
        trade_store: Arc<dyn RecordStore<TradeEntry>>,
        cache_store: Arc<dyn CacheStore>,
        settings: StatsCacheSettings,
    ) -> Self {
        // A window too large for chrono means "never stale".
        let freshness_window =
            TimeDelta::from_std(settings.freshness_window).unwrap_or(TimeDelta::MAX);

        Self {
            journal_store,
            trade_store,
            cache_store,
            clock: Arc::new(SystemClock),
            computer: StatsComputer::with_equity_curve_scope(settings.equity_curve_scope),
            settings,
            freshness_window,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the statistics for one period, recomputing and persisting them
    /// if the cached value is absent or stale.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        period: Period,
    ) -> Result<PeriodStats, StatsCacheError> {
        self.ensure_enabled(period)?;

        let key = CacheKey::new(user_id, account_id, period);
        let cached = self.cache_store.find(&key).await?;
        let now = self.clock.now();

        if let Some(record) = &cached {
            if self.is_fresh(record, now) {
                tracing::debug!(updated_at = %record.updated_at, "Serving cached statistics.");
                return Ok(record.computed.clone());
            }
            tracing::debug!(updated_at = %record.updated_at, "Cached statistics are stale.");
        }

        let (journal, trades) = self.load_records(user_id, account_id).await?;
        let computed = self
            .computer
            .compute(user_id, account_id, period, &journal, &trades, now);

        let stored = self
            .persist(cached.map(|record| record.id), key, computed, now)
            .await?;
        tracing::info!(total_pnl = %stored.computed.total_pnl, "Statistics recomputed.");

        Ok(stored.computed)
    }

    /// Returns the statistics for every configured period, in configuration order.
    pub async fn get_all(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<PeriodStats>, StatsCacheError> {
        let mut all = Vec::with_capacity(self.settings.periods.len());
        for &period in &self.settings.periods {
            all.push(self.get(user_id, account_id, period).await?);
        }
        Ok(all)
    }

    /// Recomputes every configured period from one snapshot of the records and
    /// one reference time, then persists the results as a single batch.
    ///
    /// Either every period is replaced or, on any store error, none is.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_all(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<CacheRecord>, StatsCacheError> {
        let (journal, trades) = self.load_records(user_id, account_id).await?;
        let now = self.clock.now();

        let batch: Vec<NewCacheRecord> = self
            .settings
            .periods
            .iter()
            .map(|&period| NewCacheRecord {
                key: CacheKey::new(user_id, account_id, period),
                computed: self
                    .computer
                    .compute(user_id, account_id, period, &journal, &trades, now),
                updated_at: now,
            })
            .collect();

        let records = self.cache_store.upsert_many(batch).await?;

        tracing::info!(periods = records.len(), "Statistics cache invalidated.");
        Ok(records)
    }

    /// Reports the age and freshness of a cached value without recomputing it.
    pub async fn peek(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        period: Period,
    ) -> Result<Option<CacheStatus>, StatsCacheError> {
        self.ensure_enabled(period)?;

        let key = CacheKey::new(user_id, account_id, period);
        let Some(record) = self.cache_store.find(&key).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let state = if self.is_fresh(&record, now) {
            CacheState::Fresh
        } else {
            CacheState::Stale
        };

        Ok(Some(CacheStatus {
            period,
            state,
            updated_at: record.updated_at,
            age_seconds: now.signed_duration_since(record.updated_at).num_seconds(),
        }))
    }

    fn ensure_enabled(&self, period: Period) -> Result<(), StatsCacheError> {
        if self.settings.is_enabled(period) {
            Ok(())
        } else {
            Err(StatsCacheError::PeriodNotEnabled(period))
        }
    }

    fn is_fresh(&self, record: &CacheRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.updated_at) < self.freshness_window
    }

    /// Fetches the account's completed journal entries and its trades concurrently.
    async fn load_records(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<(Vec<JournalEntry>, Vec<TradeEntry>), StatsCacheError> {
        let owned = RecordFilter::owned_by(user_id, account_id);
        let journal_filter = owned.with_status(EntryStatus::Complete);

        let (journal, trades) = tokio::try_join!(
            self.journal_store.filter(&journal_filter),
            self.trade_store.filter(&owned),
        )?;

        tracing::debug!(
            journal_entries = journal.len(),
            trades = trades.len(),
            "Loaded records for statistics."
        );
        Ok((journal, trades))
    }

    async fn persist(
        &self,
        existing: Option<Uuid>,
        key: CacheKey,
        computed: PeriodStats,
        now: DateTime<Utc>,
    ) -> Result<CacheRecord, StatsCacheError> {
        let record = match existing {
            Some(id) => {
                self.cache_store
                    .update(
                        id,
                        CacheRecordUpdate {
                            computed,
                            updated_at: now,
                        },
                    )
                    .await?
            }
            None => {
                self.cache_store
                    .create(NewCacheRecord {
                        key,
                        computed,
                        updated_at: now,
                    })
                    .await?
            }
        };
        Ok(record)
    }
}
