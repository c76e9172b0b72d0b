use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};

#[derive(Debug, Deserialize)]
pub struct Config {
  /// The relay board driving the doors
  #[serde(default)]
  pub relay: RelayConfig,
  /// Where door settings and last commanded states are persisted
  #[serde(default = "default_settings_file")]
  pub settings_file: PathBuf,
  /// Timezone the open/close schedule is evaluated in.
  ///
  /// Host local time when unset.
  #[serde(default)]
  pub timezone: Option<Tz>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
  /// Base URL of the relay board
  #[serde(default = "default_relay_host")]
  pub host: String,

  #[serde_as(as = "DurationSeconds<u64>")]
  #[serde(default = "default_relay_timeout")]
  /// How long to wait for the board before giving up on a request.
  pub timeout: Duration,
}

impl Default for RelayConfig {
  fn default() -> Self {
    RelayConfig {
      host: default_relay_host(),
      timeout: default_relay_timeout(),
    }
  }
}

fn default_relay_host() -> String {
  "http://192.168.1.100".to_owned()
}

fn default_relay_timeout() -> Duration {
  Duration::from_secs(10)
}

fn default_settings_file() -> PathBuf {
  PathBuf::from("door-settings.json")
}
