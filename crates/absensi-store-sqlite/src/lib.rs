//! SQLite backend for the absensi record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod bootstrap;
pub mod error;

pub use bootstrap::{ConnectionState, RetryPolicy};
pub use error::{Error, Result};
pub use store::SqliteStore;
