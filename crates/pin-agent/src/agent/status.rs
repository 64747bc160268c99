/*! Status projection and opacity. */

use crate::types::{AgentState, AgentStatus};

use super::PinAgent;

impl PinAgent {
  /// Snapshot the agent's externally visible state.
  pub fn status(&self) -> AgentStatus {
    let inner = self.inner.lock();
    AgentStatus {
      state: inner.state,
      pinned: inner.state.is_pinned(),
      target_app_name: inner.target.as_ref().map(|t| t.app_name.clone()),
      target_window_title: inner
        .target
        .as_ref()
        .and_then(|t| t.window_title.clone()),
      mirror_visible: inner.state == AgentState::Mirroring,
      pinned_since: inner.pinned_since,
    }
  }

  /// Set and persist the mirror opacity. The value is clamped into
  /// [0.1, 1.0] first; the clamped value is returned and, when a mirror
  /// is visible, applied immediately.
  pub fn set_opacity(&self, value: f64) -> f64 {
    let clamped = self.prefs.set_mirror_opacity(value);
    let mut inner = self.inner.lock();
    inner.opacity = clamped;
    if let Some(overlay) = inner.overlay.as_mut() {
      overlay.set_opacity(clamped);
    }
    clamped
  }

  /// The opacity a newly shown mirror will use.
  pub fn opacity(&self) -> f64 {
    self.inner.lock().opacity
  }
}
