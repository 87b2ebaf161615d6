//! Ticket event feed integration for Minder.
//!
//! This crate owns everything between the ticketing system's event feed and
//! the update engine: the wire envelopes, the per-event-type routing table,
//! the ack/requeue error classification, and a background consumer loop.
//!
//! Delivery from the feed is at-least-once, so the whole pipeline is built to
//! be idempotent: replaying an event either collapses into the duplicate
//! window or is rejected by the transition table, and in both cases the event
//! is acknowledged.

pub mod bus;
pub mod consumer;
pub mod envelope;
pub mod route;

pub use bus::InMemoryBus;
pub use consumer::Consumer;
pub use envelope::{
  STATUS_UPDATED, StatusUpdatedEvent, TicketEvent, TicketEventData,
  TicketEventType,
};
pub use route::{Disposition, Routed, route};
