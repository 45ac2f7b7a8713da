//! # Tradelog Analytics
//!
//! This crate turns a user's raw journal and trade records into the derived
//! performance statistics shown on the dashboard.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of storage, caching or clocks. It
//!   depends only on `core-types`, and the reference instant is an explicit argument.
//! - **Stateless Calculation:** The `StatsComputer` takes records as input and produces
//!   a `PeriodStats` as output. The same inputs always give the same statistics.
//!
//! ## Public API
//!
//! - `StatsComputer`: The calculator for one (user, account, period).
//! - `PeriodStats`: The cacheable statistics value.
//! - `PeriodWindow`: The calendar window a `Period` resolves to.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod period;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::StatsComputer;
pub use period::PeriodWindow;
pub use report::PeriodStats;
