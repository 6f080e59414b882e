//! Result persistence: remote store adapter, local cache, and the
//! remote→cache fallback read path.
//!
//! This crate provides:
//! - `ResultStore` / `ResultReader` capability traits and `StoreError`
//! - `RestStore`: PostgREST-style adapter (also the `DataSource` impl)
//! - `ResultCache`: bounded in-memory mirror of recent results
//! - `FallbackReader`: remote first, cache on store error

pub mod cache;
pub mod error;
pub mod fallback;
pub mod reader;
pub mod rest;

pub use cache::ResultCache;
pub use error::StoreError;
pub use fallback::{FallbackReader, ReadSource};
pub use reader::{ResultReader, ResultStore};
pub use rest::RestStore;
