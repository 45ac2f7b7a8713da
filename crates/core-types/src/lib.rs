pub mod enums;
pub mod error;
pub mod lenient;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{EntryStatus, EquityCurveScope, Period};
pub use error::CoreError;
pub use structs::{EquityPoint, JournalEntry, TradeEntry};
