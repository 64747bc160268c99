/*! Descriptor for the window a pin targets. */

use super::{Bounds, ProcessId, WindowId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The window chosen for mirroring, as observed at selection time.
///
/// Immutable after creation: geometry changes are tracked separately, and
/// choosing a new target produces a new descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TargetDescriptor {
  #[serde(rename = "windowID")]
  pub window_id: WindowId,
  #[serde(rename = "pid")]
  pub process_id: ProcessId,
  pub app_name: String,
  pub window_title: Option<String>,
  /// Bounds in top-left-origin screen coordinates.
  pub bounds: Bounds,
}
