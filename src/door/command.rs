use std::str::FromStr;

use crate::error::DoorError;

/// A manual or scheduled command against a single door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCommand {
  Open,
  Close,
  Stop,
}

impl FromStr for DoorCommand {
  type Err = DoorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "open" => Ok(DoorCommand::Open),
      "close" => Ok(DoorCommand::Close),
      "stop" => Ok(DoorCommand::Stop),
      _ => Err(DoorError::InvalidInput(format!("invalid command: {s:?}"))),
    }
  }
}
