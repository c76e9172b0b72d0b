use std::{
  fs::{self, File},
  path::{Path, PathBuf},
  sync::Mutex,
};

use serde_json::{Map, Value};

use crate::error::DoorResult;

/// Durable string/bool key-value store backing per-door settings and last
/// commanded states.
///
/// The whole document lives in a single JSON file, loaded once at startup and
/// rewritten on every mutation. The mutex serializes writers from the
/// scheduler task, the actuator worker and query-serving tasks so concurrent
/// puts cannot corrupt the file.
#[derive(Debug)]
pub struct SettingsStore {
  path: PathBuf,
  data: Mutex<Map<String, Value>>,
}

impl SettingsStore {
  /// Open the store at `path`. A missing file loads as an empty document.
  pub fn load(path: impl AsRef<Path>) -> DoorResult<SettingsStore> {
    let path = path.as_ref().to_path_buf();
    let data = if path.exists() {
      serde_json::from_str(&fs::read_to_string(&path)?)?
    }
    else {
      Map::new()
    };

    Ok(SettingsStore {
      path,
      data: Mutex::new(data),
    })
  }

  pub fn get_string(&self, key: &str, default: &str) -> String {
    let data = self.data.lock().unwrap();
    data.get(key).and_then(Value::as_str).unwrap_or(default).to_owned()
  }

  pub fn get_bool(&self, key: &str, default: bool) -> bool {
    let data = self.data.lock().unwrap();
    data.get(key).and_then(Value::as_bool).unwrap_or(default)
  }

  pub fn put_string(&self, key: &str, value: &str) -> DoorResult<()> {
    let mut data = self.data.lock().unwrap();
    data.insert(key.to_owned(), Value::from(value));
    self.save(&data)
  }

  pub fn put_bool(&self, key: &str, value: bool) -> DoorResult<()> {
    let mut data = self.data.lock().unwrap();
    data.insert(key.to_owned(), Value::from(value));
    self.save(&data)
  }

  /// Rewrite the whole document. Called with the data lock held.
  fn save(&self, data: &Map<String, Value>) -> DoorResult<()> {
    let file = File::create(&self.path)?;
    serde_json::to_writer_pretty(file, data)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::env;

  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("coop-door-settings-{}-{}.json", std::process::id(), name));
    let _ = fs::remove_file(&path);
    path
  }

  #[test]
  fn missing_file_loads_empty() {
    let store = SettingsStore::load(temp_path("missing")).unwrap();

    assert_eq!(store.get_string("door_0", "closed"), "closed");
    assert!(!store.get_bool("door_0_open_close_enabled", false));
  }

  #[test]
  fn puts_survive_a_reload() {
    let path = temp_path("reload");

    let store = SettingsStore::load(&path).unwrap();
    store.put_string("door_0_open_time", "06:15").unwrap();
    store.put_bool("door_0_open_close_enabled", true).unwrap();
    drop(store);

    let store = SettingsStore::load(&path).unwrap();
    assert_eq!(store.get_string("door_0_open_time", "07:30"), "06:15");
    assert!(store.get_bool("door_0_open_close_enabled", false));

    let _ = fs::remove_file(&path);
  }

  #[test]
  fn mismatched_value_types_fall_back_to_the_default() {
    let store = SettingsStore::load(temp_path("types")).unwrap();
    store.put_bool("door_1", true).unwrap();

    assert_eq!(store.get_string("door_1", "closed"), "closed");
  }
}
