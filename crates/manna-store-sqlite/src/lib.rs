//! SQLite backend for Manna.
//!
//! Stores every remote table as JSON documents in a single file so the
//! services can run without the hosted backend: for self-hosting, local
//! development, and tests. Wraps [`tokio_rusqlite`] so all database access
//! runs on a dedicated thread without blocking the async runtime.

mod encode;
mod procedures;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
