use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{DoorError, DoorResult};

/// The logical state of a door.
///
/// `Opening`/`Closing` are transient and observable from the relay pair while
/// it is driven. `Open`/`Closed` cannot be read back off the board once
/// motion stops and are remembered in the settings store instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
  Open,
  Opening,
  Closing,
  Closed,
}

impl DoorState {
  /// Decode a door's relay channel pair into a logical state.
  ///
  /// Both channels idle and both channels energized are indistinguishable
  /// rest states on this board, so `at_rest` supplies the remembered
  /// direction. A value outside {0, 1} can only come from a wiring fault or
  /// a concurrent external actuation.
  pub fn resolve(channel_a: u8, channel_b: u8, at_rest: impl FnOnce() -> DoorState) -> DoorResult<DoorState> {
    match (channel_a, channel_b) {
      (0, 0) | (1, 1) => Ok(at_rest()),
      (1, 0) => Ok(DoorState::Opening),
      (0, 1) => Ok(DoorState::Closing),
      (a, b) => Err(DoorError::InvariantViolation(a, b)),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DoorState::Open => "open",
      DoorState::Opening => "opening",
      DoorState::Closing => "closing",
      DoorState::Closed => "closed",
    }
  }
}

impl fmt::Display for DoorState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DoorState {
  type Err = DoorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    [DoorState::Open, DoorState::Opening, DoorState::Closing, DoorState::Closed]
      .into_iter()
      .find(|state| s.eq_ignore_ascii_case(state.as_str()))
      .ok_or_else(|| DoorError::InvalidInput(format!("invalid door state: {s:?}")))
  }
}

/// The rest state a traverse is driving a door towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
  Open,
  Closed,
}

impl TargetState {
  /// The transient state while the door travels there.
  pub fn transit_state(self) -> DoorState {
    match self {
      TargetState::Open => DoorState::Opening,
      TargetState::Closed => DoorState::Closing,
    }
  }

  /// The stable state once travel completes.
  pub fn end_state(self) -> DoorState {
    match self {
      TargetState::Open => DoorState::Open,
      TargetState::Closed => DoorState::Closed,
    }
  }
}
