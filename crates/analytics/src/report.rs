use chrono::{DateTime, Utc};
use core_types::{EquityPoint, Period};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The derived performance statistics of one account over one period.
///
/// This struct is the output of the `StatsComputer` and the value held by the
/// statistics cache. It is always replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: Period,
    /// The instant the period window was resolved against.
    pub as_of: DateTime<Utc>,

    // I. Journal-level aggregates
    pub total_pnl: Decimal,
    pub total_trades: u64,
    pub wins: u64,
    pub losses: u64,
    /// Percentage in `0..=100`; zero when no wins or losses were recorded.
    pub win_rate: Decimal,

    // II. Trade-level metrics
    pub avg_win: Decimal,
    /// Magnitude of the average losing trade (never negative).
    pub avg_loss: Decimal,
    pub profit_factor: Option<Decimal>, // None when there are no losses to divide by
    pub expectancy: Option<Decimal>,    // None when no trades were taken
    pub largest_win: Decimal,
    pub largest_loss: Decimal,

    // III. Curve
    pub equity_curve: Vec<EquityPoint>,
}

impl PeriodStats {
    /// Creates zeroed-out statistics for a period with no activity.
    pub fn empty(period: Period, as_of: DateTime<Utc>) -> Self {
        Self {
            period,
            as_of,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
            wins: 0,
            losses: 0,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: None,
            expectancy: None,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            equity_curve: Vec::new(),
        }
    }
}
