/*! Error types for agent operations. */

use super::AgentState;

/// Which permission a denied operation was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
  Capture,
  Accessibility,
}

impl std::fmt::Display for Permission {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Permission::Capture => write!(f, "capture"),
      Permission::Accessibility => write!(f, "accessibility"),
    }
  }
}

/// Errors that can occur during agent operations.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
  #[error("Invalid state transition from {from:?} to {to:?}")]
  InvalidStateTransition { from: AgentState, to: AgentState },

  #[error("No target window found")]
  NoTargetWindow,

  #[error("Capture failed: {0}")]
  CaptureFailure(String),

  #[error("Permission denied: {0}")]
  PermissionDenied(Permission),
}

/// Result type for agent operations.
pub type PinResult<T> = Result<T, PinError>;
