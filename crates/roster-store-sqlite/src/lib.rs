//! SQLite backend for the Roster directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] serves as both the
//! [`DirectoryStore`](roster_core::store::DirectoryStore) and the
//! [`IdentityProvider`](roster_core::identity::IdentityProvider).

mod encode;
mod identity;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use identity::MIN_PROVIDER_PASSWORD;
pub use store::SqliteStore;
