use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the fixed rolling windows statistics are aggregated over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    Today,
    Week,
    Month,
    AllTime,
}

impl Period {
    /// Every period, narrowest window first.
    pub const ALL: [Period; 4] = [Period::Today, Period::Week, Period::Month, Period::AllTime];

    /// The canonical storage/wire name of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "TODAY",
            Period::Week => "WEEK",
            Period::Month => "MONTH",
            Period::AllTime => "ALL_TIME",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    /// Accepts the canonical names case-insensitively, with `-` or `_` in `ALL_TIME`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TODAY" => Ok(Period::Today),
            "WEEK" => Ok(Period::Week),
            "MONTH" => Ok(Period::Month),
            "ALL_TIME" | "ALLTIME" => Ok(Period::AllTime),
            _ => Err(CoreError::InvalidInput("period".to_string(), s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Lifecycle state of a journal entry. Only `Complete` entries count toward statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Draft,
    Complete,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Complete => "complete",
        }
    }

    /// Maps any stored status string onto a known state.
    /// Anything other than `complete` is treated as still in progress.
    pub fn from_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("complete") {
            EntryStatus::Complete
        } else {
            EntryStatus::Draft
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntryStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(EntryStatus::from_lenient).unwrap_or_default())
    }
}

/// Which journal entries feed the equity curve of a `PeriodStats`.
///
/// `FullHistory` draws the curve over every completed entry even when the scalar
/// statistics are bounded to a period. `Period` restricts it to the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityCurveScope {
    #[default]
    FullHistory,
    Period,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parses_loose_spellings() {
        assert_eq!("today".parse::<Period>().unwrap(), Period::Today);
        assert_eq!(" Week ".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("all-time".parse::<Period>().unwrap(), Period::AllTime);
        assert_eq!("ALL_TIME".parse::<Period>().unwrap(), Period::AllTime);
        assert!("quarter".parse::<Period>().is_err());
    }

    #[test]
    fn period_serializes_to_canonical_name() {
        let json = serde_json::to_string(&Period::AllTime).unwrap();
        assert_eq!(json, "\"ALL_TIME\"");
        let back: Period = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(back, Period::Month);
    }

    #[test]
    fn unknown_or_missing_status_is_draft() {
        let status: EntryStatus = serde_json::from_str("\"COMPLETE\"").unwrap();
        assert_eq!(status, EntryStatus::Complete);
        let status: EntryStatus = serde_json::from_str("\"in_review\"").unwrap();
        assert_eq!(status, EntryStatus::Draft);
        let status: EntryStatus = serde_json::from_str("null").unwrap();
        assert_eq!(status, EntryStatus::Draft);
    }
}
