use crate::DbError;
use crate::store::{
    CacheKey, CacheRecord, CacheRecordUpdate, CacheStore, NewCacheRecord, RecordFilter,
    RecordStore, SortOrder,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::lenient::count_from_i64;
use core_types::{EntryStatus, JournalEntry, Period, TradeEntry};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{Executor, QueryBuilder, Row};
use uuid::Uuid;

const JOURNAL_COLUMNS: &str =
    "id, user_id, account_id, entry_date, daily_pnl, trade_count, wins, losses, status";
const TRADE_COLUMNS: &str = "id, user_id, account_id, date_key, pnl_currency";
const CACHE_COLUMNS: &str =
    "id, user_id, account_id, period, computed, equity_curve_snapshot, updated_at";

/// The `DbRepository` provides the PostgreSQL implementation of the record and
/// cache stores. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Appends the equality filters, ordering and limit shared by both record tables.
    fn push_filter(
        query: &mut QueryBuilder<'_, Postgres>,
        filter: &RecordFilter,
        date_column: &str,
        has_status: bool,
    ) {
        query
            .push(" WHERE user_id = ")
            .push_bind(filter.user_id)
            .push(" AND account_id = ")
            .push_bind(filter.account_id);

        if let (true, Some(status)) = (has_status, filter.status) {
            query.push(" AND LOWER(status) = ").push_bind(status.as_str());
        }

        let direction = match filter.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        query.push(format!(" ORDER BY {date_column} {direction}, id {direction}"));

        if let Some(limit) = filter.limit {
            query
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
    }
}

// ==============================================================================
// Row Mapping
// ==============================================================================
// Numeric columns are nullable; anything missing decodes to zero.

fn journal_from_row(row: &PgRow) -> Result<JournalEntry, DbError> {
    let status: Option<String> = row.try_get("status")?;
    Ok(JournalEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        entry_date: row.try_get("entry_date")?,
        daily_pnl: row.try_get::<Option<Decimal>, _>("daily_pnl")?.unwrap_or_default(),
        trade_count: count_from_i64(row.try_get::<Option<i32>, _>("trade_count")?.map(i64::from)),
        wins: count_from_i64(row.try_get::<Option<i32>, _>("wins")?.map(i64::from)),
        losses: count_from_i64(row.try_get::<Option<i32>, _>("losses")?.map(i64::from)),
        status: status
            .as_deref()
            .map(EntryStatus::from_lenient)
            .unwrap_or_default(),
    })
}

fn trade_from_row(row: &PgRow) -> Result<TradeEntry, DbError> {
    Ok(TradeEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        date_key: row.try_get("date_key")?,
        pnl_currency: row.try_get::<Option<Decimal>, _>("pnl_currency")?.unwrap_or_default(),
    })
}

fn cache_from_row(row: &PgRow) -> Result<CacheRecord, DbError> {
    let period: String = row.try_get("period")?;
    let period: Period = period
        .parse()
        .map_err(|e: core_types::CoreError| DbError::InvalidData(e.to_string()))?;
    let computed: JsonValue = row.try_get("computed")?;
    let snapshot: JsonValue = row.try_get("equity_curve_snapshot")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(CacheRecord {
        id: row.try_get("id")?,
        key: CacheKey::new(row.try_get("user_id")?, row.try_get("account_id")?, period),
        computed: serde_json::from_value(computed)?,
        equity_curve_snapshot: serde_json::from_value(snapshot)?,
        updated_at,
    })
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

// ==============================================================================
// Journal Entries
// ==============================================================================

#[async_trait]
impl RecordStore<JournalEntry> for DbRepository {
    async fn filter(&self, filter: &RecordFilter) -> Result<Vec<JournalEntry>, DbError> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {JOURNAL_COLUMNS} FROM journal_entries"));
        Self::push_filter(&mut query, filter, "entry_date", true);

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(journal_from_row).collect()
    }

    async fn create(&self, entry: JournalEntry) -> Result<JournalEntry, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO journal_entries (
                id, user_id, account_id, entry_date, daily_pnl, trade_count, wins, losses, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {JOURNAL_COLUMNS}
            "#
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.account_id)
        .bind(entry.entry_date)
        .bind(entry.daily_pnl)
        .bind(count_to_db(entry.trade_count))
        .bind(count_to_db(entry.wins))
        .bind(count_to_db(entry.losses))
        .bind(entry.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(entry_id = %entry.id, date = %entry.entry_date, "Journal entry created.");
        journal_from_row(&row)
    }

    async fn update(&self, id: Uuid, entry: JournalEntry) -> Result<JournalEntry, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE journal_entries
            SET user_id = $2, account_id = $3, entry_date = $4, daily_pnl = $5,
                trade_count = $6, wins = $7, losses = $8, status = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOURNAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(entry.user_id)
        .bind(entry.account_id)
        .bind(entry.entry_date)
        .bind(entry.daily_pnl)
        .bind(count_to_db(entry.trade_count))
        .bind(count_to_db(entry.wins))
        .bind(count_to_db(entry.losses))
        .bind(entry.status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        journal_from_row(&row)
    }
}

// ==============================================================================
// Trade Entries
// ==============================================================================

#[async_trait]
impl RecordStore<TradeEntry> for DbRepository {
    /// Trades carry no status, so `filter.status` is ignored.
    async fn filter(&self, filter: &RecordFilter) -> Result<Vec<TradeEntry>, DbError> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {TRADE_COLUMNS} FROM trade_entries"));
        Self::push_filter(&mut query, filter, "date_key", false);

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(trade_from_row).collect()
    }

    async fn create(&self, trade: TradeEntry) -> Result<TradeEntry, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO trade_entries (id, user_id, account_id, date_key, pnl_currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TRADE_COLUMNS}
            "#
        ))
        .bind(trade.id)
        .bind(trade.user_id)
        .bind(trade.account_id)
        .bind(trade.date_key)
        .bind(trade.pnl_currency)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(trade_id = %trade.id, date = %trade.date_key, "Trade entry created.");
        trade_from_row(&row)
    }

    async fn update(&self, id: Uuid, trade: TradeEntry) -> Result<TradeEntry, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE trade_entries
            SET user_id = $2, account_id = $3, date_key = $4, pnl_currency = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {TRADE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(trade.user_id)
        .bind(trade.account_id)
        .bind(trade.date_key)
        .bind(trade.pnl_currency)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        trade_from_row(&row)
    }
}

// ==============================================================================
// Statistics Cache
// ==============================================================================

#[async_trait]
impl CacheStore for DbRepository {
    async fn find(&self, key: &CacheKey) -> Result<Option<CacheRecord>, DbError> {
        let row = sqlx::query(&format!(
            "SELECT {CACHE_COLUMNS} FROM stats_cache WHERE user_id = $1 AND account_id = $2 AND period = $3"
        ))
        .bind(key.user_id)
        .bind(key.account_id)
        .bind(key.period.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(cache_from_row).transpose()
    }

    /// Uses `ON CONFLICT ... DO UPDATE` so two readers racing on an absent key
    /// still leave a single row behind (last write wins).
    async fn create(&self, record: NewCacheRecord) -> Result<CacheRecord, DbError> {
        upsert_cache(&self.pool, &record).await
    }

    async fn update(&self, id: Uuid, update: CacheRecordUpdate) -> Result<CacheRecord, DbError> {
        let computed = serde_json::to_value(&update.computed)?;
        let snapshot = serde_json::to_value(&update.computed.equity_curve)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE stats_cache
            SET computed = $2, equity_curve_snapshot = $3, updated_at = $4
            WHERE id = $1
            RETURNING {CACHE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(computed)
        .bind(snapshot)
        .bind(update.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        cache_from_row(&row)
    }

    /// Runs every upsert inside one transaction; dropping it on error rolls back.
    async fn upsert_many(&self, records: Vec<NewCacheRecord>) -> Result<Vec<CacheRecord>, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut written = Vec::with_capacity(records.len());
        for record in &records {
            written.push(upsert_cache(&mut *tx, record).await?);
        }
        tx.commit().await?;

        tracing::debug!(records = written.len(), "Cache records upserted.");
        Ok(written)
    }
}

async fn upsert_cache<'c, E>(executor: E, record: &NewCacheRecord) -> Result<CacheRecord, DbError>
where
    E: Executor<'c, Database = Postgres>,
{
    let computed = serde_json::to_value(&record.computed)?;
    let snapshot = serde_json::to_value(&record.computed.equity_curve)?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO stats_cache (
            id, user_id, account_id, period, computed, equity_curve_snapshot, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id, account_id, period) DO UPDATE SET
            computed = EXCLUDED.computed,
            equity_curve_snapshot = EXCLUDED.equity_curve_snapshot,
            updated_at = EXCLUDED.updated_at
        RETURNING {CACHE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(record.key.user_id)
    .bind(record.key.account_id)
    .bind(record.key.period.as_str())
    .bind(computed)
    .bind(snapshot)
    .bind(record.updated_at)
    .fetch_one(executor)
    .await?;

    cache_from_row(&row)
}
