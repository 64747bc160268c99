/*!
Permission gate for screen capture and accessibility.

Capture permission is a hard requirement for pinning; accessibility only
improves geometry precision and its absence is non-fatal.
*/

use std::sync::Arc;

use serde::Serialize;
use ts_rs::TS;

use crate::platform::Platform;
use crate::types::{Permission, PinError, PinResult};

/// Snapshot of both permission states.
#[derive(Debug, Clone, Copy, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PermissionProbe {
  pub capture_granted: bool,
  pub accessibility_granted: bool,
}

/// Queries and requests the two permissions the agent needs.
#[derive(Clone)]
pub struct PermissionGate {
  platform: Arc<dyn Platform>,
}

impl std::fmt::Debug for PermissionGate {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PermissionGate").finish_non_exhaustive()
  }
}

impl PermissionGate {
  pub fn new(platform: Arc<dyn Platform>) -> Self {
    Self { platform }
  }

  /// Query both permissions without prompting. Any capture-probe failure
  /// counts as not granted.
  pub fn probe(&self) -> PermissionProbe {
    PermissionProbe {
      capture_granted: self.platform.preflight_capture_access(),
      accessibility_granted: self.platform.accessibility_trusted(),
    }
  }

  /// Fail with `PermissionDenied("capture")` unless capture is granted.
  ///
  /// A refused check also requests capture access, which shows the system
  /// prompt on first contact and puts the app in the Screen Recording
  /// list the user is sent to.
  pub fn require_capture(&self) -> PinResult<()> {
    if self.platform.preflight_capture_access() {
      Ok(())
    } else {
      self.platform.request_capture_access();
      log::error!("screen capture permission missing; pin refused");
      Err(PinError::PermissionDenied(Permission::Capture))
    }
  }

  /// Trigger the user-facing accessibility prompt. Non-blocking.
  pub fn prompt_accessibility(&self) {
    self.platform.request_accessibility_trust();
  }

  /// Open the privacy settings pane for screen capture.
  pub fn guide_to_capture_settings(&self) {
    self.platform.open_capture_settings();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::mock::MockPlatform;
  use crate::types::PinError;

  #[test]
  fn probe_reflects_both_permissions() {
    let mock = MockPlatform::with_defaults();
    let gate = PermissionGate::new(mock.clone());

    let probe = gate.probe();
    assert!(probe.capture_granted);
    assert!(probe.accessibility_granted);

    mock.set_capture_access(false);
    mock.set_accessibility(false);
    let probe = gate.probe();
    assert!(!probe.capture_granted);
    assert!(!probe.accessibility_granted);
  }

  #[test]
  fn require_capture_fails_when_denied() {
    let mock = MockPlatform::with_defaults();
    let gate = PermissionGate::new(mock.clone());
    assert!(gate.require_capture().is_ok());
    assert_eq!(mock.capture_prompt_count(), 0);

    mock.set_capture_access(false);
    let err = gate.require_capture().unwrap_err();
    assert_eq!(err.to_string(), "Permission denied: capture");
    assert!(matches!(err, PinError::PermissionDenied(_)));
    // The refusal doubles as the one-time system prompt trigger.
    assert_eq!(mock.capture_prompt_count(), 1);
  }

  #[test]
  fn prompt_and_guidance_reach_the_platform() {
    let mock = MockPlatform::with_defaults();
    let gate = PermissionGate::new(mock.clone());
    gate.prompt_accessibility();
    gate.guide_to_capture_settings();
    assert_eq!(mock.accessibility_prompt_count(), 1);
    assert_eq!(mock.settings_opened_count(), 1);
  }
}
