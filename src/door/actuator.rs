use std::sync::Arc;

use tokio::{
  sync::{mpsc, oneshot},
  time::sleep,
};

use super::{definition::DoorDefinition, state::TargetState};
use crate::{
  error::{DoorError, DoorResult},
  relay::RelayClient,
  settings::SettingsStore,
};

/// A queued actuation against a single door.
#[derive(Debug)]
struct Actuation {
  door: &'static DoorDefinition,
  kind: ActuationKind,
  /// Present when the submitter waits for the outcome (`stop` does).
  ack: Option<oneshot::Sender<DoorResult<()>>>,
}

#[derive(Debug, Clone, Copy)]
enum ActuationKind {
  Travel(TargetState),
  Stop,
}

/// Handle used to submit door actuations.
///
/// All commands funnel into one queue consumed by a single [`ActuatorWorker`],
/// the only writer to the relay board. At most one actuation is in flight
/// system-wide; a second command, for the same or another door, queues behind
/// the first in submission order.
#[derive(Debug, Clone)]
pub struct DoorActuator {
  commands: mpsc::UnboundedSender<Actuation>,
}

impl DoorActuator {
  /// Create the actuator handle and the worker that executes its queue.
  ///
  /// The caller spawns the worker once at startup; commands submitted before
  /// that are accepted and wait in the queue.
  pub fn new(relay: RelayClient, settings: Arc<SettingsStore>) -> (DoorActuator, ActuatorWorker) {
    let (commands, queue) = mpsc::unbounded_channel();

    (
      DoorActuator { commands },
      ActuatorWorker {
        queue,
        relay,
        settings,
      },
    )
  }

  /// Queue a full open traverse. Returns as soon as the command is accepted.
  pub fn open(&self, door: &'static DoorDefinition) -> DoorResult<()> {
    self.submit(door, ActuationKind::Travel(TargetState::Open))
  }

  /// Queue a full close traverse. Returns as soon as the command is accepted.
  pub fn close(&self, door: &'static DoorDefinition) -> DoorResult<()> {
    self.submit(door, ActuationKind::Travel(TargetState::Closed))
  }

  /// De-energize both of the door's channels, halting any motion.
  ///
  /// Queued like any other command, so it cannot preempt a traverse already
  /// holding the worker, but the call waits for execution and reports the
  /// relay outcome.
  pub async fn stop(&self, door: &'static DoorDefinition) -> DoorResult<()> {
    let (ack, outcome) = oneshot::channel();
    self
      .commands
      .send(Actuation {
        door,
        kind: ActuationKind::Stop,
        ack: Some(ack),
      })
      .map_err(|_| DoorError::ActuatorClosed)?;

    outcome.await.map_err(|_| DoorError::ActuatorClosed)?
  }

  fn submit(&self, door: &'static DoorDefinition, kind: ActuationKind) -> DoorResult<()> {
    self
      .commands
      .send(Actuation { door, kind, ack: None })
      .map_err(|_| DoorError::ActuatorClosed)
  }
}

/// Sole consumer of the actuation queue and sole writer to the relay board.
#[derive(Debug)]
pub struct ActuatorWorker {
  queue: mpsc::UnboundedReceiver<Actuation>,
  relay: RelayClient,
  settings: Arc<SettingsStore>,
}

impl ActuatorWorker {
  /// Execute queued actuations strictly one at a time, in submission order.
  ///
  /// Runs until every [`DoorActuator`] handle has been dropped.
  pub async fn run(mut self) {
    while let Some(actuation) = self.queue.recv().await {
      let result = match actuation.kind {
        ActuationKind::Travel(target) => {
          self.traverse(actuation.door, target).await;
          Ok(())
        }
        ActuationKind::Stop => self.stop(actuation.door).await,
      };

      if let Some(ack) = actuation.ack {
        // the submitter may have given up waiting
        let _ = ack.send(result);
      }
    }
  }

  /// De-energize both channels of a door.
  async fn stop(&self, door: &DoorDefinition) -> DoorResult<()> {
    self.relay.set_channel(door.relay_channel_a, false).await?;
    self.relay.set_channel(door.relay_channel_b, false).await?;
    Ok(())
  }

  /// Drive a door through a full timed traverse.
  ///
  /// Failures are logged rather than returned: the command was acknowledged
  /// when it was queued, so there is nobody left to report them to. The
  /// relays are released on every path, an error can never leave a channel
  /// latched.
  async fn traverse(&self, door: &'static DoorDefinition, target: TargetState) {
    let transit = target.transit_state();

    // record commanded intent before the relays move so a concurrent state
    // query reflects the transition rather than stale telemetry
    if let Err(err) = self.settings.put_string(&door.id.state_key(), transit.as_str()) {
      log::error!("failed to persist {} state of door {}: {}", transit, door.id, err);
    }

    if let Err(err) = self.drive(door, target).await {
      // a partial failure can leave one channel energized; the release below
      // is the corrective attempt
      log::error!("failed to drive door {} {}: {}", door.id, transit, err);
    }

    for channel in [door.relay_channel_a, door.relay_channel_b] {
      if let Err(err) = self.relay.set_channel(channel, false).await {
        log::error!("failed to de-energize channel {} of door {}: {}", channel, door.id, err);
      }
    }

    let end = target.end_state();
    if let Err(err) = self.settings.put_string(&door.id.state_key(), end.as_str()) {
      log::error!("failed to persist {} state of door {}: {}", end, door.id, err);
    }
  }

  async fn drive(&self, door: &DoorDefinition, target: TargetState) -> DoorResult<()> {
    // cancel any in-flight motion before reversing or repeating a direction
    self.stop(door).await?;

    let (channel_a_on, channel_b_on, hold) = match target {
      TargetState::Open => (true, false, door.open_duration),
      TargetState::Closed => (false, true, door.close_duration),
    };
    self.relay.set_channel(door.relay_channel_a, channel_a_on).await?;
    self.relay.set_channel(door.relay_channel_b, channel_b_on).await?;

    // hold the direction energized for the full traverse
    sleep(hold).await;

    Ok(())
  }

  /// Pop the next queued actuation without executing it.
  #[cfg(test)]
  pub(crate) fn try_next_actuation(&mut self) -> Option<(super::DoorId, Option<TargetState>)> {
    self.queue.try_recv().ok().map(|actuation| {
      let target = match actuation.kind {
        ActuationKind::Travel(target) => Some(target),
        ActuationKind::Stop => None,
      };
      (actuation.door.id, target)
    })
  }
}
