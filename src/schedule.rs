use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{Local, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use tokio::time::{self, Instant};

use crate::{
  door::{definition::DoorDefinition, DoorActuator, DoorId},
  error::{DoorError, DoorResult},
  settings::SettingsStore,
};

/// Minimum time between two automatic actuations of the same door.
///
/// A schedule time matches for its whole minute while the loop ticks every
/// second; without this window a matching minute would retrigger on every
/// tick.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(120);

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background loop firing each door's configured automatic open/close times.
#[derive(Debug)]
pub struct ScheduleMonitor {
  doors: &'static [DoorDefinition],
  settings: Arc<SettingsStore>,
  actuator: DoorActuator,
  /// Zone the schedule is evaluated in; host local time when unset.
  timezone: Option<Tz>,
  /// When each door last auto-triggered. In-memory only; a process restart
  /// resets the debounce.
  last_triggered: HashMap<DoorId, Instant>,
}

impl ScheduleMonitor {
  pub fn new(
    doors: &'static [DoorDefinition],
    settings: Arc<SettingsStore>,
    actuator: DoorActuator,
    timezone: Option<Tz>,
  ) -> ScheduleMonitor {
    ScheduleMonitor {
      doors,
      settings,
      actuator,
      timezone,
      last_triggered: HashMap::new(),
    }
  }

  /// Evaluate every door once per second, for the lifetime of the process.
  pub async fn run(mut self) {
    let mut ticker = time::interval(TICK_PERIOD);
    loop {
      ticker.tick().await;
      let now = self.wall_clock_time();
      self.tick(now);
    }
  }

  fn wall_clock_time(&self) -> NaiveTime {
    match self.timezone {
      Some(timezone) => Utc::now().with_timezone(&timezone).time(),
      None => Local::now().time(),
    }
  }

  /// One evaluation pass over all doors, in declaration order.
  fn tick(&mut self, now: NaiveTime) {
    for door in self.doors {
      if let Err(err) = self.evaluate(door, now) {
        // one broken door must not starve the others
        log::error!("scheduled actuation of door {} failed: {}", door.id, err);
      }
    }
  }

  fn evaluate(&mut self, door: &'static DoorDefinition, now: NaiveTime) -> DoorResult<()> {
    if !door.auto_enabled(&self.settings) {
      return Ok(());
    }

    if let Some(last) = self.last_triggered.get(&door.id) {
      if last.elapsed() < DEBOUNCE_WINDOW {
        return Ok(());
      }
    }

    let open_at = parse_schedule_time(&door.open_time(&self.settings))?;
    let close_at = parse_schedule_time(&door.close_time(&self.settings))?;
    let open_matched = same_hour_and_minute(now, open_at);
    let close_matched = same_hour_and_minute(now, close_at);

    if open_matched {
      // open wins when both times land on the same minute
      log::info!("opening door {} at scheduled time {}", door.id, now.format("%H:%M:%S"));
      self.actuator.open(door)?;
    }
    else if close_matched {
      log::info!("closing door {} at scheduled time {}", door.id, now.format("%H:%M:%S"));
      self.actuator.close(door)?;
    }

    if open_matched || close_matched {
      self.last_triggered.insert(door.id, Instant::now());
    }

    Ok(())
  }
}

/// Parse a "HH:MM" schedule time.
pub fn parse_schedule_time(value: &str) -> DoorResult<NaiveTime> {
  NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| DoorError::InvalidInput(format!("invalid time: {value:?}")))
}

/// Seconds and below are ignored; a schedule time matches for a whole minute.
fn same_hour_and_minute(a: NaiveTime, b: NaiveTime) -> bool {
  a.hour() == b.hour() && a.minute() == b.minute()
}

#[cfg(test)]
mod tests {
  use std::{env, fs, path::PathBuf, time::Duration as StdDuration};

  use super::*;
  use crate::{
    config::RelayConfig,
    door::{actuator::ActuatorWorker, state::TargetState},
    relay::RelayClient,
  };

  static TEST_DOORS: [DoorDefinition; 2] = [
    DoorDefinition {
      id: DoorId(0),
      open_duration: StdDuration::from_millis(50),
      close_duration: StdDuration::from_millis(50),
      relay_channel_a: 0,
      relay_channel_b: 1,
      default_open_at: "07:30",
      default_close_at: "21:00",
    },
    DoorDefinition {
      id: DoorId(1),
      open_duration: StdDuration::from_millis(50),
      close_duration: StdDuration::from_millis(50),
      relay_channel_a: 2,
      relay_channel_b: 3,
      default_open_at: "07:30",
      default_close_at: "21:00",
    },
  ];

  fn temp_settings(name: &str) -> Arc<SettingsStore> {
    let path = PathBuf::from(env::temp_dir()).join(format!("coop-door-schedule-{}-{}.json", std::process::id(), name));
    let _ = fs::remove_file(&path);
    Arc::new(SettingsStore::load(path).unwrap())
  }

  /// A monitor whose actuator queue is observable and never executed.
  fn monitor(name: &str) -> (ScheduleMonitor, ActuatorWorker, Arc<SettingsStore>) {
    let settings = temp_settings(name);
    let relay = RelayClient::with_config(RelayConfig {
      host: "http://127.0.0.1:9".to_owned(),
      timeout: StdDuration::from_secs(1),
    })
    .unwrap();
    let (actuator, worker) = DoorActuator::new(relay, Arc::clone(&settings));
    let monitor = ScheduleMonitor::new(&TEST_DOORS, Arc::clone(&settings), actuator, None);

    (monitor, worker, settings)
  }

  fn at(hour: u32, minute: u32, second: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, second).unwrap()
  }

  fn enable(settings: &SettingsStore, door: &DoorDefinition) {
    settings.put_bool(&door.id.open_close_enabled_key(), true).unwrap();
  }

  #[tokio::test(start_paused = true)]
  async fn disabled_doors_are_skipped() {
    let (mut monitor, mut worker, _settings) = monitor("disabled");

    monitor.tick(at(7, 30, 0));

    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn open_time_triggers_once_per_minute_window() {
    let (mut monitor, mut worker, settings) = monitor("debounce");
    enable(&settings, &TEST_DOORS[0]);

    // the loop sees the matching minute on all sixty of its ticks
    for second in 0..60 {
      monitor.tick(at(7, 30, second));
      time::advance(StdDuration::from_secs(1)).await;
    }

    assert_eq!(worker.try_next_actuation(), Some((DoorId(0), Some(TargetState::Open))));
    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn retriggers_once_the_debounce_expires() {
    let (mut monitor, mut worker, settings) = monitor("retrigger");
    enable(&settings, &TEST_DOORS[0]);

    monitor.tick(at(7, 30, 0));
    time::advance(DEBOUNCE_WINDOW + StdDuration::from_secs(1)).await;
    monitor.tick(at(7, 30, 0));

    assert_eq!(worker.try_next_actuation(), Some((DoorId(0), Some(TargetState::Open))));
    assert_eq!(worker.try_next_actuation(), Some((DoorId(0), Some(TargetState::Open))));
    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn close_time_triggers_a_close() {
    let (mut monitor, mut worker, settings) = monitor("close");
    enable(&settings, &TEST_DOORS[1]);

    monitor.tick(at(21, 0, 30));

    assert_eq!(worker.try_next_actuation(), Some((DoorId(1), Some(TargetState::Closed))));
    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn open_wins_when_both_times_match() {
    let (mut monitor, mut worker, settings) = monitor("collision");
    enable(&settings, &TEST_DOORS[0]);
    settings.put_string(&DoorId(0).open_time_key(), "08:00").unwrap();
    settings.put_string(&DoorId(0).close_time_key(), "08:00").unwrap();

    monitor.tick(at(8, 0, 0));

    assert_eq!(worker.try_next_actuation(), Some((DoorId(0), Some(TargetState::Open))));
    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn malformed_time_skips_only_the_offending_door() {
    let (mut monitor, mut worker, settings) = monitor("malformed");
    enable(&settings, &TEST_DOORS[0]);
    enable(&settings, &TEST_DOORS[1]);
    settings.put_string(&DoorId(0).open_time_key(), "soon").unwrap();

    monitor.tick(at(7, 30, 0));

    assert_eq!(worker.try_next_actuation(), Some((DoorId(1), Some(TargetState::Open))));
    assert_eq!(worker.try_next_actuation(), None);
  }

  #[tokio::test(start_paused = true)]
  async fn overridden_times_take_precedence_over_defaults() {
    let (mut monitor, mut worker, settings) = monitor("override");
    enable(&settings, &TEST_DOORS[0]);
    settings.put_string(&DoorId(0).open_time_key(), "05:45").unwrap();

    monitor.tick(at(7, 30, 0));
    assert_eq!(worker.try_next_actuation(), None);

    monitor.tick(at(5, 45, 59));
    assert_eq!(worker.try_next_actuation(), Some((DoorId(0), Some(TargetState::Open))));
  }
}
