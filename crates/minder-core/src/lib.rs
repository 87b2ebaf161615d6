//! Core types and logic for the Minder ticket-status tracker: the status
//! state machine, the duplicate filter, and the update engine, together with
//! the store and notifier seams the other crates implement.
//!
//! No HTTP, no database: every crate in the workspace depends on this one,
//! and this one depends only on the async runtime and serialisation stack.

pub mod dedup;
pub mod engine;
pub mod error;
pub mod memory;
pub mod notify;
pub mod record;
pub mod status;
pub mod store;
pub mod transition;

pub use error::{Error, Result};
