/*!
Window enumeration and target selection.

Raw z-ordered window data comes from the platform; every selection rule
(layer, minimum size, excluded bundles) is applied here so it can be
tested without a window server.
*/

use std::sync::Arc;

use serde::Serialize;
use ts_rs::TS;

use crate::platform::{Platform, RawWindow};
use crate::types::{Bounds, TargetDescriptor, WindowId};

/// Bundle identifiers never offered as pin targets: ourselves, the
/// launcher front-end that issues commands, and system launcher UI.
const EXCLUDED_BUNDLE_IDS: &[&str] = &[
  "com.pin.agent",
  "com.raycast.macos",
  "com.apple.Spotlight",
  "com.apple.screencaptureui",
];

/// Minimum candidate dimensions; anything smaller is a tooltip or palette.
const MIN_CANDIDATE_SIZE: f64 = 50.0;

/// Stricter minimum for the menu-bar picker.
const MIN_PICKER_SIZE: f64 = 100.0;

/// An entry in the menu-bar window picker: one window per application.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PickerItem {
  /// Owner-name label, with the window title appended when present.
  pub label: String,
  #[serde(flatten)]
  pub target: TargetDescriptor,
}

/// Queries on-screen windows and picks pin candidates.
#[derive(Clone)]
pub struct WindowEnumerator {
  platform: Arc<dyn Platform>,
}

impl std::fmt::Debug for WindowEnumerator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WindowEnumerator").finish_non_exhaustive()
  }
}

impl WindowEnumerator {
  pub fn new(platform: Arc<dyn Platform>) -> Self {
    Self { platform }
  }

  /// Pinnable windows, front-to-back in z-order.
  pub fn list_candidates(&self) -> Vec<TargetDescriptor> {
    candidates(&self.platform.window_list())
  }

  /// The frontmost pinnable window.
  ///
  /// Excluded windows are skipped, so invoking "pin" from the launcher
  /// pins what was underneath the launcher, not the launcher itself.
  pub fn find_frontmost(&self) -> Option<TargetDescriptor> {
    self.list_candidates().into_iter().next()
  }

  /// A candidate by identifier.
  pub fn find_candidate(&self, id: WindowId) -> Option<TargetDescriptor> {
    self
      .list_candidates()
      .into_iter()
      .find(|c| c.window_id == id)
  }

  /// Whether the window server still reports `id` on-screen.
  pub fn exists(&self, id: WindowId) -> bool {
    self
      .platform
      .window_list()
      .iter()
      .any(|w| w.window_id == id && w.on_screen)
  }

  /// Current bounds of `id`, if on-screen.
  pub fn bounds(&self, id: WindowId) -> Option<Bounds> {
    self
      .platform
      .window_list()
      .iter()
      .find(|w| w.window_id == id && w.on_screen)
      .map(|w| w.bounds)
  }

  /// Picker entries: at most one window per owning process, larger
  /// minimum dimensions, friendlier labels.
  pub fn list_by_app(&self) -> Vec<PickerItem> {
    picker_items(&self.platform.window_list())
  }
}

fn is_candidate(window: &RawWindow, min_size: f64) -> bool {
  if !window.on_screen || window.layer != 0 {
    return false;
  }
  if window.bounds.w <= min_size || window.bounds.h <= min_size {
    return false;
  }
  if let Some(bundle_id) = &window.bundle_id {
    if EXCLUDED_BUNDLE_IDS.contains(&bundle_id.as_str()) {
      return false;
    }
  }
  true
}

fn describe(window: &RawWindow) -> TargetDescriptor {
  TargetDescriptor {
    window_id: window.window_id,
    process_id: window.process_id,
    app_name: window.owner_name.clone(),
    window_title: window.title.clone().filter(|t| !t.is_empty()),
    bounds: window.bounds,
  }
}

fn candidates(windows: &[RawWindow]) -> Vec<TargetDescriptor> {
  windows
    .iter()
    .filter(|w| is_candidate(w, MIN_CANDIDATE_SIZE))
    .map(describe)
    .collect()
}

fn picker_items(windows: &[RawWindow]) -> Vec<PickerItem> {
  let mut seen_pids = Vec::new();
  let mut items = Vec::new();
  for window in windows {
    if !is_candidate(window, MIN_PICKER_SIZE) || seen_pids.contains(&window.process_id) {
      continue;
    }
    seen_pids.push(window.process_id);
    let target = describe(window);
    let label = match &target.window_title {
      Some(title) => format!("{} \u{2014} {title}", target.app_name),
      None => target.app_name.clone(),
    };
    items.push(PickerItem { label, target });
  }
  items
}
