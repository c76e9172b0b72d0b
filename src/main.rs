#![warn(rust_2018_idioms)]

use std::{fs, sync::Arc};

use coop_door::{
  config::Config,
  door::{DoorActuator, DOORS},
  relay::RelayClient,
  schedule::ScheduleMonitor,
  service::DoorService,
  settings::SettingsStore,
};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() {
  SimpleLogger::new()
    .with_module_level("reqwest", log::LevelFilter::Warn)
    .init()
    .unwrap();

  let config = fs::read_to_string("door-config.toml").expect("unable to read door-config.toml");
  let config: Config = toml::from_str(&config).expect("unable to parse door-config.toml");

  let settings = Arc::new(SettingsStore::load(&config.settings_file).expect("unable to load door settings"));
  let relay = RelayClient::with_config(config.relay.clone()).expect("unable to build relay client");

  let (actuator, worker) = DoorActuator::new(relay.clone(), Arc::clone(&settings));
  tokio::spawn(worker.run());

  let service = DoorService::new(&DOORS, relay, Arc::clone(&settings), actuator.clone());
  match service.current_state().await {
    Ok(state) => {
      for (door, entry) in DOORS.iter().zip(&state.doors) {
        log::info!(
          "door {} is {} (auto open {} / close {}, enabled: {})",
          door.id,
          entry.state,
          entry.open_time,
          entry.close_time,
          entry.is_enabled
        );
      }
    }
    Err(err) => log::warn!("unable to query relay board at startup: {}", err),
  }

  ScheduleMonitor::new(&DOORS, settings, actuator, config.timezone).run().await;
}
