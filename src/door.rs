use std::fmt;

pub use actuator::{ActuatorWorker, DoorActuator};
pub use definition::{DoorDefinition, DOORS};
pub use state::DoorState;

pub mod actuator;
pub mod command;
pub mod definition;
pub mod state;

/// An identifier for a door.
///
/// Indexes the compiled-in definition table and namespaces the door's
/// persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorId(pub u8);

impl DoorId {
  /// Key the door's last commanded state is persisted under.
  pub fn state_key(&self) -> String {
    format!("door_{}", self.0)
  }

  pub fn open_time_key(&self) -> String {
    format!("door_{}_open_time", self.0)
  }

  pub fn close_time_key(&self) -> String {
    format!("door_{}_close_time", self.0)
  }

  pub fn open_close_enabled_key(&self) -> String {
    format!("door_{}_open_close_enabled", self.0)
  }
}

impl fmt::Display for DoorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u8> for DoorId {
  fn from(id: u8) -> Self {
    DoorId(id)
  }
}
