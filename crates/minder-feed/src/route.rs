//! Maps inbound ticket events onto engine updates.
//!
//! Each event type implies a target status and an actor; the engine then
//! validates the transition against the stored record. Routing is idempotent
//! because the engine is: a redelivered event lands as a duplicate or is
//! rejected by the transition table, never applied twice.

use minder_core::{
  Error, Result,
  engine::UpdateEngine,
  notify::Notifier,
  record::{SYSTEM_ACTOR, UpdateOutcome, UpdateRequest},
  status::TicketStatus,
  store::StatusStore,
};

use crate::envelope::{TicketEvent, TicketEventData, TicketEventType};

/// What routing did with one event.
#[derive(Debug)]
pub enum Routed {
  /// The event produced an update and the engine accepted it.
  Applied(UpdateOutcome),
  /// The event carries nothing to apply; dropped with a reason.
  Ignored(&'static str),
}

/// What to tell the broker after a handler failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
  /// Permanent failure: acknowledge so the event is not redelivered.
  Ack,
  /// Transient failure: leave the event for redelivery.
  Requeue,
}

impl Disposition {
  /// Validation and transition failures will fail identically on every
  /// redelivery, so they are acked away; store and notify failures may clear.
  pub fn for_error(error: &Error) -> Self {
    if error.is_retryable() {
      Self::Requeue
    } else {
      Self::Ack
    }
  }
}

/// Route one inbound event through the engine.
pub async fn route<S, N>(
  engine: &UpdateEngine<S, N>,
  event: TicketEvent,
) -> Result<Routed>
where
  S: StatusStore,
  N: Notifier,
{
  let TicketEventData {
    id,
    current_status,
    assigned_to,
    resolved_by,
    closed_by,
    updated_by,
    reason,
    ..
  } = event.data;

  if id.is_empty() {
    return Err(Error::MissingField("id"));
  }

  let (status, actor, reason) = match event.event_type {
    TicketEventType::Created => {
      let status = match current_status.as_deref() {
        Some(raw) => TicketStatus::parse(raw)?,
        None => TicketStatus::Open,
      };
      let actor = updated_by.unwrap_or_else(|| SYSTEM_ACTOR.to_owned());
      (status, actor, reason)
    }
    TicketEventType::Updated | TicketEventType::StatusChanged => {
      let Some(raw) = current_status else {
        return Ok(Routed::Ignored("no status change"));
      };
      let status = TicketStatus::parse(&raw)?;
      let actor = updated_by
        .or(closed_by)
        .unwrap_or_else(|| SYSTEM_ACTOR.to_owned());
      (status, actor, reason)
    }
    TicketEventType::Assigned => {
      let reason = reason.or_else(|| {
        assigned_to.as_deref().map(|who| format!("Assigned to {who}"))
      });
      let actor = assigned_to.unwrap_or_else(|| SYSTEM_ACTOR.to_owned());
      (TicketStatus::InProgress, actor, reason)
    }
    TicketEventType::Resolved => {
      let actor = resolved_by
        .or(updated_by)
        .unwrap_or_else(|| SYSTEM_ACTOR.to_owned());
      (TicketStatus::Resolved, actor, reason)
    }
    TicketEventType::Deleted => {
      let actor = updated_by.unwrap_or_else(|| SYSTEM_ACTOR.to_owned());
      (TicketStatus::Deleted, actor, reason)
    }
    TicketEventType::Unknown => {
      return Ok(Routed::Ignored("unknown event type"));
    }
  };

  let mut req = UpdateRequest::feed(id, status, actor);
  req.reason = reason;
  let outcome = engine.apply(req).await?;
  Ok(Routed::Applied(outcome))
}
