use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use core_types::Period;

/// The calendar window a `Period` covers, resolved against a reference instant.
///
/// Windows are open-ended towards the future: anything dated on or after `start`
/// is inside. Calendar boundaries are taken in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub period: Period,
    /// First day inside the window, `None` for an unbounded window.
    pub start: Option<NaiveDate>,
}

impl PeriodWindow {
    pub fn resolve(period: Period, as_of: DateTime<Utc>) -> Self {
        let today = as_of.date_naive();
        let start = match period {
            Period::Today => Some(today),
            Period::Week => {
                let offset = u64::from(today.weekday().num_days_from_monday());
                today.checked_sub_days(Days::new(offset))
            }
            Period::Month => today.with_day(1),
            Period::AllTime => None,
        };
        Self { period, start }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start)
    }
}
