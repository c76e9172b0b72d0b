use std::time::Duration;

use super::{state::DoorState, DoorId};
use crate::settings::SettingsStore;

/// Static configuration mapping a logical door to its two relay channels and
/// traverse durations.
///
/// Created once, immutable for the process lifetime.
#[derive(Debug)]
pub struct DoorDefinition {
  pub id: DoorId,
  /// Time a full open traverse takes.
  pub open_duration: Duration,
  /// Time a full close traverse takes.
  pub close_duration: Duration,
  /// Channel energized while the door opens.
  pub relay_channel_a: u8,
  /// Channel energized while the door closes.
  pub relay_channel_b: u8,
  pub default_open_at: &'static str,
  pub default_close_at: &'static str,
}

/// All doors driven by this controller, in scheduler evaluation order.
pub static DOORS: [DoorDefinition; 2] = [
  DoorDefinition {
    id: DoorId(0),
    open_duration: Duration::from_millis(20_000),
    close_duration: Duration::from_millis(16_000),
    relay_channel_a: 1,
    relay_channel_b: 0,
    default_open_at: "07:30",
    default_close_at: "21:00",
  },
  DoorDefinition {
    id: DoorId(1),
    open_duration: Duration::from_millis(10_000),
    close_duration: Duration::from_millis(8_000),
    relay_channel_a: 2,
    relay_channel_b: 3,
    default_open_at: "07:30",
    default_close_at: "21:00",
  },
];

impl DoorDefinition {
  /// Effective open time, preferring the persisted override.
  pub fn open_time(&self, settings: &SettingsStore) -> String {
    settings.get_string(&self.id.open_time_key(), self.default_open_at)
  }

  /// Effective close time, preferring the persisted override.
  pub fn close_time(&self, settings: &SettingsStore) -> String {
    settings.get_string(&self.id.close_time_key(), self.default_close_at)
  }

  /// Whether automatic open/close is enabled for this door. Off until
  /// explicitly enabled.
  pub fn auto_enabled(&self, settings: &SettingsStore) -> bool {
    settings.get_bool(&self.id.open_close_enabled_key(), false)
  }

  /// The state this door was last commanded to.
  ///
  /// This is how we remember which of the two rest states the relay pair
  /// cannot distinguish; a door that was never commanded counts as closed.
  pub fn last_state(&self, settings: &SettingsStore) -> DoorState {
    let value = settings.get_string(&self.id.state_key(), "");
    if value.is_empty() {
      return DoorState::Closed;
    }

    value.parse().unwrap_or_else(|_| {
      log::warn!("door {} has unparseable persisted state {:?}, assuming closed", self.id, value);
      DoorState::Closed
    })
  }
}
