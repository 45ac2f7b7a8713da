//! # Tradelog Statistics Cache
//!
//! Serves per-period trading statistics for an account out of a persistent cache.
//! A read returns the stored value while it is younger than the configured
//! freshness window and otherwise recomputes it from the account's records and
//! writes it back. Mutations of journal data are followed by `invalidate_all`,
//! which refreshes every configured period from a single snapshot.
//!
//! The manager only talks to the storage contracts in the `database` crate, so
//! the same code runs against PostgreSQL and the in-memory stores.

pub mod clock;
pub mod error;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StatsCacheError;
pub use manager::{CacheState, CacheStatus, StatsCacheManager};
