/*! Events broadcast to status subscribers. */

use super::TargetDescriptor;
use serde::Serialize;
use ts_rs::TS;

/// Emitted whenever the pin lifecycle changes.
///
/// Target disappearance is observed as `Pinned` followed by `Unpinned`;
/// subscribers do not see a distinct "disappeared" event.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum StatusEvent {
  #[serde(rename = "pinned")]
  Pinned { target: TargetDescriptor },

  #[serde(rename = "unpinned")]
  Unpinned,

  #[serde(rename = "mirror:hidden")]
  MirrorHidden,

  #[serde(rename = "mirror:shown")]
  MirrorShown,
}
