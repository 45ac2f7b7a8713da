//! # Tradelog Database Crate
//!
//! This crate defines the storage contracts the statistics core works against and
//! provides their adapters.
//!
//! ## Architectural Principles
//!
//! - **Typed Capabilities:** Each record family has its own `RecordStore<R>`, and the
//!   statistics cache has a `CacheStore`. Callers hold trait objects, so adapters can
//!   be swapped without touching the core.
//! - **Asynchronous & Pooled:** The PostgreSQL adapter uses a connection pool
//!   (`PgPool`) and runtime-checked `sqlx` queries.
//! - **Equality Filters Only:** Stores filter by owner and status and sort by date.
//!   Period windows are applied by the caller after fetching.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: Establish the pool and bring the schema up-to-date.
//! - `DbRepository`: PostgreSQL implementation of every store.
//! - `InMemoryRecordStore` / `InMemoryCacheStore`: In-process implementations.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::{InMemoryCacheStore, InMemoryRecordStore};
pub use repository::DbRepository;
pub use store::{
    CacheKey, CacheRecord, CacheRecordUpdate, CacheStore, NewCacheRecord, Record, RecordFilter,
    RecordStore, SortOrder,
};
