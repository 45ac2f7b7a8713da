use crate::period::PeriodWindow;
use crate::report::PeriodStats;
use chrono::{DateTime, NaiveTime, Utc};
use core_types::{EquityCurveScope, EquityPoint, JournalEntry, Period, TradeEntry};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A stateless calculator for deriving period statistics from journal activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsComputer {
    equity_curve_scope: EquityCurveScope,
}

impl StatsComputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_equity_curve_scope(equity_curve_scope: EquityCurveScope) -> Self {
        Self { equity_curve_scope }
    }

    /// The main entry point for calculating period statistics.
    ///
    /// # Arguments
    ///
    /// * `user_id`, `account_id` - The owner of the statistics. Records belonging to anyone
    ///   else are ignored.
    /// * `period` - The rolling window the scalar statistics cover.
    /// * `journal_entries` - Daily journal records, in any order.
    /// * `trade_entries` - Individual trade records, in any order.
    /// * `as_of` - The reference instant the period window is resolved against.
    ///
    /// # Returns
    ///
    /// The `PeriodStats`. Empty inputs produce zeroed statistics rather than an error.
    pub fn compute(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        period: Period,
        journal_entries: &[JournalEntry],
        trade_entries: &[TradeEntry],
        as_of: DateTime<Utc>,
    ) -> PeriodStats {
        let window = PeriodWindow::resolve(period, as_of);
        let mut stats = PeriodStats::empty(period, as_of);

        let completed: Vec<&JournalEntry> = journal_entries
            .iter()
            .filter(|entry| entry.belongs_to(user_id, account_id) && entry.is_complete())
            .collect();

        let in_window: Vec<&JournalEntry> = completed
            .iter()
            .copied()
            .filter(|entry| window.contains(entry.entry_date))
            .collect();

        let trades: Vec<&TradeEntry> = trade_entries
            .iter()
            .filter(|trade| trade.belongs_to(user_id, account_id) && window.contains(trade.date_key))
            .collect();

        self.aggregate_journal(&in_window, &mut stats);
        self.aggregate_trades(&trades, &mut stats);

        stats.equity_curve = match self.equity_curve_scope {
            EquityCurveScope::FullHistory => self.build_equity_curve(&completed),
            EquityCurveScope::Period => self.build_equity_curve(&in_window),
        };

        stats
    }

    /// Sums the journal-level figures and derives win rate and expectancy from them.
    ///
    /// Money sums saturate at the `Decimal` bounds instead of overflowing.
    fn aggregate_journal(&self, entries: &[&JournalEntry], stats: &mut PeriodStats) {
        for entry in entries {
            stats.total_pnl = stats.total_pnl.saturating_add(entry.daily_pnl);
            stats.total_trades += u64::from(entry.trade_count);
            stats.wins += u64::from(entry.wins);
            stats.losses += u64::from(entry.losses);
        }

        let decided = stats.wins + stats.losses;
        if decided > 0 {
            stats.win_rate =
                Decimal::from(stats.wins) / Decimal::from(decided) * Decimal::ONE_HUNDRED;
        }

        if stats.total_trades > 0 {
            stats.expectancy = Some(stats.total_pnl / Decimal::from(stats.total_trades));
        }
    }

    /// Calculates the per-trade metrics. Break-even trades count as neither win nor loss.
    fn aggregate_trades(&self, trades: &[&TradeEntry], stats: &mut PeriodStats) {
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut winning_trades = 0u64;
        let mut losing_trades = 0u64;

        for trade in trades {
            let pnl = trade.pnl_currency;

            if pnl > Decimal::ZERO {
                gross_profit = gross_profit.saturating_add(pnl);
                winning_trades += 1;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < Decimal::ZERO {
                gross_loss = gross_loss.saturating_add(pnl.abs());
                losing_trades += 1;
                stats.largest_loss = stats.largest_loss.min(pnl);
            }
        }

        if winning_trades > 0 {
            stats.avg_win = gross_profit / Decimal::from(winning_trades);
        }

        if losing_trades > 0 {
            stats.avg_loss = gross_loss / Decimal::from(losing_trades);
        }

        // A ratio too large to represent is reported as undefined.
        if gross_loss > Decimal::ZERO {
            stats.profit_factor = gross_profit.checked_div(gross_loss);
        }
    }

    /// Builds a cumulative equity curve, one point per journal day, oldest first.
    fn build_equity_curve(&self, entries: &[&JournalEntry]) -> Vec<EquityPoint> {
        let mut ordered = entries.to_vec();
        ordered.sort_by_key(|entry| entry.entry_date);

        let mut equity = Decimal::ZERO;
        ordered
            .into_iter()
            .map(|entry| {
                equity = equity.saturating_add(entry.daily_pnl);
                EquityPoint {
                    timestamp: entry.entry_date.and_time(NaiveTime::MIN).and_utc(),
                    equity,
                    pnl: entry.daily_pnl,
                }
            })
            .collect()
    }
}
