//! In-process event bus.
//!
//! Stands in for the real broker behind two broadcast channels: `inbound`
//! carries ticket events toward the consumer, `outbound` carries committed
//! status changes away from the engine. Delivery is fan-out to whoever is
//! subscribed at publish time; at-least-once semantics (redelivery, lag) are
//! the broker adapter's concern in a real deployment.

use std::convert::Infallible;

use minder_core::notify::{Notifier, StatusChange};
use tokio::sync::broadcast;

use crate::envelope::{StatusUpdatedEvent, TicketEvent};

const DEFAULT_CAPACITY: usize = 256;

/// A broadcast-backed bus for wiring the feed consumer and the engine's
/// notifier together in one process.
pub struct InMemoryBus {
  inbound:  broadcast::Sender<TicketEvent>,
  outbound: broadcast::Sender<StatusUpdatedEvent>,
}

impl InMemoryBus {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  /// `capacity` bounds each channel; slow subscribers see lag errors rather
  /// than unbounded buffering.
  pub fn with_capacity(capacity: usize) -> Self {
    let (inbound, _) = broadcast::channel(capacity);
    let (outbound, _) = broadcast::channel(capacity);
    Self { inbound, outbound }
  }

  /// Feed one inbound event to current subscribers. Events published while
  /// nobody is subscribed are dropped, as they would be on a fan-out topic
  /// with no consumer group.
  pub fn publish_inbound(&self, event: TicketEvent) {
    let _ = self.inbound.send(event);
  }

  pub fn subscribe_inbound(&self) -> broadcast::Receiver<TicketEvent> {
    self.inbound.subscribe()
  }

  pub fn subscribe_outbound(&self) -> broadcast::Receiver<StatusUpdatedEvent> {
    self.outbound.subscribe()
  }
}

impl Default for InMemoryBus {
  fn default() -> Self {
    Self::new()
  }
}

impl Notifier for InMemoryBus {
  type Error = Infallible;

  async fn publish(&self, change: &StatusChange) -> Result<(), Infallible> {
    // Zero subscribers is not a failure; the change is simply unobserved.
    let _ = self
      .outbound
      .send(StatusUpdatedEvent::from(change.clone()));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use minder_core::{record::HistoryEntry, status::TicketStatus};

  use super::*;
  use crate::envelope::{STATUS_UPDATED, TicketEventData, TicketEventType};

  #[tokio::test]
  async fn inbound_events_reach_subscribers() {
    let bus = InMemoryBus::new();
    let mut rx = bus.subscribe_inbound();

    bus.publish_inbound(TicketEvent::new(
      TicketEventType::Created,
      TicketEventData {
        id: "T-1".to_owned(),
        ..Default::default()
      },
    ));

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, TicketEventType::Created);
    assert_eq!(event.data.id, "T-1");
  }

  #[tokio::test]
  async fn notifier_wraps_changes_in_the_outbound_envelope() {
    let bus = InMemoryBus::new();
    let mut rx = bus.subscribe_outbound();

    let change = StatusChange::for_entry("T-2", &HistoryEntry {
      status:     TicketStatus::Closed,
      timestamp:  Utc::now(),
      updated_by: "alice".to_owned(),
      reason:     "done".to_owned(),
    });
    bus.publish(&change).await.unwrap();

    let envelope = rx.recv().await.unwrap();
    assert_eq!(envelope.event_type, STATUS_UPDATED);
    assert_eq!(envelope.data, change);
  }

  #[tokio::test]
  async fn publishing_with_no_subscribers_is_fine() {
    let bus = InMemoryBus::new();
    bus.publish_inbound(TicketEvent::new(
      TicketEventType::Deleted,
      TicketEventData::default(),
    ));

    let change = StatusChange::for_entry("T-3", &HistoryEntry {
      status:     TicketStatus::Deleted,
      timestamp:  Utc::now(),
      updated_by: "system".to_owned(),
      reason:     "gone".to_owned(),
    });
    bus.publish(&change).await.unwrap();
  }
}
