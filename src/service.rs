use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
  door::{command::DoorCommand, definition::DoorDefinition, state::DoorState, DoorActuator, DoorId},
  error::{DoorError, DoorResult},
  relay::{RelayClient, RELAY_CHANNELS},
  schedule::parse_schedule_time,
  settings::SettingsStore,
};

/// Snapshot of every door, built fresh on each query and never persisted.
#[derive(Debug, Serialize)]
pub struct CurrentState {
  pub queried_at: DateTime<Local>,
  /// One entry per door, in definition order.
  pub doors: Vec<DoorEntry>,
}

#[derive(Debug, Serialize)]
pub struct DoorEntry {
  pub state: DoorState,
  pub is_enabled: bool,
  pub open_time: String,
  pub close_time: String,
}

/// Schedule settings submitted for one door.
#[derive(Debug, Deserialize)]
pub struct ChangeTimesRequest {
  pub enabled: bool,
  pub open_time: String,
  pub close_time: String,
}

/// The door-control operations exposed to the presentation layer.
#[derive(Debug, Clone)]
pub struct DoorService {
  doors: &'static [DoorDefinition],
  relay: RelayClient,
  settings: Arc<SettingsStore>,
  actuator: DoorActuator,
}

impl DoorService {
  pub fn new(
    doors: &'static [DoorDefinition],
    relay: RelayClient,
    settings: Arc<SettingsStore>,
    actuator: DoorActuator,
  ) -> DoorService {
    DoorService {
      doors,
      relay,
      settings,
      actuator,
    }
  }

  /// Query the relay board once and resolve the logical state of every door.
  ///
  /// Telemetry is re-read on every call; a door mid-actuation shows its
  /// commanded transition.
  pub async fn current_state(&self) -> DoorResult<CurrentState> {
    let channels = self.relay.query_channels().await?;

    let mut doors = Vec::with_capacity(self.doors.len());
    for door in self.doors {
      doors.push(DoorEntry {
        state: self.resolve_state(door, &channels)?,
        is_enabled: door.auto_enabled(&self.settings),
        open_time: door.open_time(&self.settings),
        close_time: door.close_time(&self.settings),
      });
    }

    Ok(CurrentState {
      queried_at: Local::now(),
      doors,
    })
  }

  /// Execute a manual command against one door.
  ///
  /// `open`/`close` return once the actuation is queued; `stop` waits for
  /// the relays to be released. Malformed input fails before any relay I/O.
  pub async fn change_state(&self, door_id: DoorId, command: &str) -> DoorResult<()> {
    let door = self.door(door_id)?;

    match command.parse()? {
      DoorCommand::Open => self.actuator.open(door),
      DoorCommand::Close => self.actuator.close(door),
      DoorCommand::Stop => self.actuator.stop(door).await,
    }
  }

  /// Persist a door's automatic schedule settings.
  pub fn change_times(&self, door_id: DoorId, request: ChangeTimesRequest) -> DoorResult<()> {
    let door = self.door(door_id)?;

    // reject malformed times before touching the store
    parse_schedule_time(&request.open_time)?;
    parse_schedule_time(&request.close_time)?;

    self.settings.put_bool(&door.id.open_close_enabled_key(), request.enabled)?;
    self.settings.put_string(&door.id.open_time_key(), &request.open_time)?;
    self.settings.put_string(&door.id.close_time_key(), &request.close_time)?;

    Ok(())
  }

  /// Decode one door's channel pair, falling back to the remembered rest
  /// state.
  fn resolve_state(&self, door: &DoorDefinition, channels: &[u8; RELAY_CHANNELS]) -> DoorResult<DoorState> {
    let channel_a = channels[door.relay_channel_a as usize];
    let channel_b = channels[door.relay_channel_b as usize];

    DoorState::resolve(channel_a, channel_b, || door.last_state(&self.settings))
  }

  fn door(&self, id: DoorId) -> DoorResult<&'static DoorDefinition> {
    self
      .doors
      .iter()
      .find(|door| door.id == id)
      .ok_or_else(|| DoorError::InvalidInput(format!("unknown door id: {id}")))
  }
}
