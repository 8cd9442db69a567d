//! SQLite backend for the Sanskrit document store.
//!
//! Every database operation checks a connection out of a bounded
//! [`ConnectionManager`] and runs on [`tokio_rusqlite`]'s background thread,
//! so callers never block the async runtime.

mod encode;
mod schema;
mod store;

pub mod config;
pub mod error;
pub mod pool;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use pool::{ConnectionManager, PooledConnection};
pub use store::SanskritDb;
