//! SQLite-backed implementation of the Minder status store.
//!
//! Every query goes through [`tokio_rusqlite`], which owns the connection on
//! a worker thread and keeps blocking rusqlite calls off the async executor.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
