//! SQLite backend for libwall.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Implements both
//! [`libwall_core::store::WallStore`] and
//! [`libwall_core::user::UserDirectory`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
