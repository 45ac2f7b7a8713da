use core_types::{EquityCurveScope, Period};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
/// Every section is optional; missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub stats_cache: StatsCacheSettings,
    pub logging: LoggingSettings,
}

/// Connection pool parameters for the PostgreSQL record and cache stores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string. When absent, `DATABASE_URL` from the environment is used.
    pub url: Option<String>,
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Parameters for the HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        }
    }
}

/// Policy of the statistics cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatsCacheSettings {
    /// Maximum age of a cached result before a read recomputes it.
    /// A zero window recomputes on every read.
    #[serde(with = "humantime_serde")]
    pub freshness_window: Duration,

    /// Periods that are served and that an invalidation recomputes, in display order.
    pub periods: Vec<Period>,

    /// Whether the equity curve spans the whole history or only the period window.
    pub equity_curve_scope: EquityCurveScope,
}

impl Default for StatsCacheSettings {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(5 * 60),
            periods: Period::ALL.to_vec(),
            equity_curve_scope: EquityCurveScope::FullHistory,
        }
    }
}

impl StatsCacheSettings {
    pub fn is_enabled(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }
}

/// Parameters for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to daily rolling files in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
