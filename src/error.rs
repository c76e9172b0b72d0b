use thiserror::Error;

pub type DoorResult<T> = Result<T, DoorError>;

#[derive(Debug, Error)]
pub enum DoorError {
  /// The relay board answered, but not with anything usable.
  ///
  /// Covers blank bodies, malformed token lists and non-zero status codes.
  /// The board does not document its status codes beyond "0 is ok", so they
  /// are reported verbatim rather than interpreted.
  #[error("unexpected relay board response: {0}")]
  Protocol(String),
  /// A door's relay channel pair is in a combination single-pair wiring
  /// cannot produce. Indicates a wiring fault or an external actuation.
  #[error("invalid relay channel pair: ({0}, {1})")]
  InvariantViolation(u8, u8),
  #[error("invalid input: {0}")]
  InvalidInput(String),
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
  #[error("the actuator worker is no longer running")]
  ActuatorClosed,
}
