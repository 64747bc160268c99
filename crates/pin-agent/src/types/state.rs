/*! Agent lifecycle state and its readonly status projection. */

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

/// Lifecycle state of the agent. Four values, dispatched exhaustively at
/// every transition site.
///
/// Legal transitions:
/// - `Idle` → `Mirroring` (pin succeeds) or `Error` (pin hard-fails)
/// - `Mirroring` → `MirrorHidden` (hover-enter settled)
/// - `MirrorHidden` → `Mirroring` (pointer leaves, or foreground changes
///   away from the target)
/// - `Mirroring`/`MirrorHidden` → `Idle` (unpin, panic, target disappeared)
/// - `Error` → `Idle` (unpin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AgentState {
  Idle,
  Mirroring,
  MirrorHidden,
  Error,
}

impl AgentState {
  /// True in the states where a target is pinned.
  pub const fn is_pinned(self) -> bool {
    matches!(self, AgentState::Mirroring | AgentState::MirrorHidden)
  }
}

/// Readonly projection of the agent's current state.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AgentStatus {
  pub state: AgentState,
  pub pinned: bool,
  pub target_app_name: Option<String>,
  pub target_window_title: Option<String>,
  /// True iff the mirror is showing frames (state is `Mirroring`).
  pub mirror_visible: bool,
  /// When the latest pin succeeded. Cleared on unpin.
  #[serde(skip_serializing_if = "Option::is_none")]
  #[ts(type = "string | null")]
  pub pinned_since: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pinned_states() {
    assert!(!AgentState::Idle.is_pinned());
    assert!(AgentState::Mirroring.is_pinned());
    assert!(AgentState::MirrorHidden.is_pinned());
    assert!(!AgentState::Error.is_pinned());
  }

  #[test]
  fn state_serializes_snake_case() {
    let json = serde_json::to_string(&AgentState::MirrorHidden).unwrap();
    assert_eq!(json, "\"mirror_hidden\"");
    let json = serde_json::to_string(&AgentState::Mirroring).unwrap();
    assert_eq!(json, "\"mirroring\"");
  }
}
