//! The feed consumer: a long-running task that drains inbound ticket events
//! into the engine.
//!
//! Failures never kill the loop. Permanent failures (validation, rejected
//! transitions) are logged and dropped; transient ones are logged at error
//! level and, against a real broker, would be nacked for redelivery. The
//! in-memory bus has no redelivery, so here the disposition only decides the
//! log severity.

use std::sync::Arc;

use minder_core::{engine::UpdateEngine, notify::Notifier, store::StatusStore};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, warn};

use crate::{
  envelope::TicketEvent,
  route::{Disposition, Routed, route},
};

/// Drains one inbound subscription until shutdown is signalled or the channel
/// closes.
pub struct Consumer<S, N> {
  engine:   Arc<UpdateEngine<S, N>>,
  inbound:  broadcast::Receiver<TicketEvent>,
  shutdown: broadcast::Receiver<()>,
}

impl<S, N> Consumer<S, N>
where
  S: StatusStore + 'static,
  N: Notifier + 'static,
{
  pub fn new(
    engine: Arc<UpdateEngine<S, N>>,
    inbound: broadcast::Receiver<TicketEvent>,
    shutdown: broadcast::Receiver<()>,
  ) -> Self {
    Self {
      engine,
      inbound,
      shutdown,
    }
  }

  pub fn spawn(mut self) -> JoinHandle<()> {
    tokio::spawn(async move { self.run().await })
  }

  async fn run(&mut self) {
    loop {
      tokio::select! {
        _ = self.shutdown.recv() => {
          debug!("feed consumer shutting down");
          break;
        }
        event = self.inbound.recv() => match event {
          Ok(event) => self.handle(event).await,
          Err(broadcast::error::RecvError::Lagged(missed)) => {
            warn!(missed, "feed consumer lagged, events were dropped");
          }
          Err(broadcast::error::RecvError::Closed) => {
            debug!("feed channel closed");
            break;
          }
        },
      }
    }
  }

  async fn handle(&self, event: TicketEvent) {
    let ticket_id = event.data.id.clone();
    match route(&self.engine, event).await {
      Ok(Routed::Applied(outcome)) => {
        debug!(
          ticket_id = %ticket_id,
          kind = ?outcome.kind,
          "feed event applied"
        );
      }
      Ok(Routed::Ignored(why)) => {
        debug!(ticket_id = %ticket_id, why, "feed event ignored");
      }
      Err(error) => match Disposition::for_error(&error) {
        Disposition::Ack => {
          warn!(ticket_id = %ticket_id, error = %error, "feed event dropped");
        }
        Disposition::Requeue => {
          error!(
            ticket_id = %ticket_id,
            error = %error,
            "feed event failed, eligible for redelivery"
          );
        }
      },
    }
  }
}
