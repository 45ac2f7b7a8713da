use crate::enums::EntryStatus;
use crate::lenient;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The journal record for one trading day of one account.
///
/// Journal entries are the authoritative source for the day's P&L, trade count and
/// win/loss tally. Numeric fields decode leniently: anything missing or malformed
/// becomes zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub entry_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub daily_pnl: Decimal,
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub trade_count: u32,
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub wins: u32,
    #[serde(default, deserialize_with = "lenient::count_or_zero")]
    pub losses: u32,
    #[serde(default)]
    pub status: EntryStatus,
}

impl JournalEntry {
    /// Creates a completed journal entry with a fresh id.
    pub fn new(
        user_id: Uuid,
        account_id: Uuid,
        entry_date: NaiveDate,
        daily_pnl: Decimal,
        trade_count: u32,
        wins: u32,
        losses: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            entry_date,
            daily_pnl,
            trade_count,
            wins,
            losses,
            status: EntryStatus::Complete,
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == EntryStatus::Complete
    }

    pub fn belongs_to(&self, user_id: Uuid, account_id: Uuid) -> bool {
        self.user_id == user_id && self.account_id == account_id
    }
}

/// A single executed trade, used for the per-trade metrics journal totals can't express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub date_key: NaiveDate,
    #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
    pub pnl_currency: Decimal,
}

impl TradeEntry {
    pub fn new(user_id: Uuid, account_id: Uuid, date_key: NaiveDate, pnl_currency: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            date_key,
            pnl_currency,
        }
    }

    pub fn belongs_to(&self, user_id: Uuid, account_id: Uuid) -> bool {
        self.user_id == user_id && self.account_id == account_id
    }
}

/// One point of a cumulative equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Running total of `pnl` up to and including this point.
    pub equity: Decimal,
    pub pnl: Decimal,
}
