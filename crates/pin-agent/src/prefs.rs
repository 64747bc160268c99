/*!
Persisted preferences.

A single JSON file under the user config directory holding one key,
`mirrorOpacity`. Values are clamped into [0.1, 1.0] before use and before
persisting; an unset or zero value reads back as the default 1.0.
*/

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OPACITY: f64 = 1.0;
pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;

/// Clamp an opacity value into the legal range.
pub fn clamp_opacity(value: f64) -> f64 {
  if !value.is_finite() {
    return DEFAULT_OPACITY;
  }
  value.clamp(MIN_OPACITY, MAX_OPACITY)
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
  #[serde(rename = "mirrorOpacity", default)]
  mirror_opacity: f64,
}

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct PrefStore {
  path: PathBuf,
}

impl PrefStore {
  /// Store at the default location (`<config dir>/Pin/prefs.json`).
  pub fn new() -> Self {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    Self {
      path: base.join("Pin").join("prefs.json"),
    }
  }

  /// Store at an explicit path.
  pub fn at_path(path: PathBuf) -> Self {
    Self { path }
  }

  fn read(&self) -> PrefsFile {
    match fs::read_to_string(&self.path) {
      Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
      Err(_) => PrefsFile::default(),
    }
  }

  fn write(&self, prefs: &PrefsFile) {
    if let Some(parent) = self.path.parent() {
      if let Err(e) = fs::create_dir_all(parent) {
        log::warn!("could not create prefs directory: {e}");
        return;
      }
    }
    match serde_json::to_string_pretty(prefs) {
      Ok(data) => {
        if let Err(e) = fs::write(&self.path, data) {
          log::warn!("could not persist prefs: {e}");
        }
      }
      Err(e) => log::warn!("could not serialize prefs: {e}"),
    }
  }

  /// The persisted mirror opacity, clamped. Unset or zero means default.
  pub fn mirror_opacity(&self) -> f64 {
    let stored = self.read().mirror_opacity;
    if stored == 0.0 {
      DEFAULT_OPACITY
    } else {
      clamp_opacity(stored)
    }
  }

  /// Persist a new mirror opacity. The value is clamped first.
  pub fn set_mirror_opacity(&self, value: f64) -> f64 {
    let clamped = clamp_opacity(value);
    self.write(&PrefsFile {
      mirror_opacity: clamped,
    });
    clamped
  }
}

impl Default for PrefStore {
  fn default() -> Self {
    Self::new()
  }
}
