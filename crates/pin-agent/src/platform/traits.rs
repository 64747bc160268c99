/*!
Platform abstraction traits.

These traits define the contract between the agent core and the windowing
system. The core only uses these traits; `macos/` implements them against
the real window server and capture facility, and tests run against a
scripted double.

Implementations must never invoke [`EventSink`] callbacks synchronously
from inside a [`Platform`] method call. Events arrive on their own threads
after the call returns; the agent serializes them internally.
*/

use std::sync::Arc;

use crate::capture::{CaptureConfig, DisplaySink};
use crate::types::{Bounds, PinResult, Point, ProcessId, TargetDescriptor, WindowId};

/// A window as reported by the window server, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawWindow {
  pub window_id: WindowId,
  pub process_id: ProcessId,
  pub owner_name: String,
  pub title: Option<String>,
  /// Bounds in top-left-origin screen coordinates.
  pub bounds: Bounds,
  /// Window server layer. Normal application windows are layer 0.
  pub layer: i32,
  pub on_screen: bool,
  pub bundle_id: Option<String>,
}

/// A connected display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayInfo {
  /// Frame in top-left-origin global coordinates.
  pub frame: Bounds,
  /// The same frame as the windowing system reports it, bottom-left-origin.
  pub cocoa_frame: Bounds,
  /// Backing scale factor (points to device pixels).
  pub scale: f64,
  /// Maximum refresh rate in frames per second. Zero when unknown.
  pub max_fps: f64,
}

/// Callbacks from the platform into the agent.
pub trait EventSink: Send + Sync + 'static {
  /// The foreground application changed.
  fn frontmost_app_changed(&self, pid: ProcessId);

  /// The pointer moved (or dragged) anywhere on screen, in top-left-origin
  /// coordinates.
  fn pointer_moved(&self, at: Point);

  /// The overlay's unpin affordance was clicked.
  fn unpin_clicked(&self);
}

/// A running per-window capture stream.
pub trait CaptureStream: Send {
  /// Apply a new width/height/frame-rate configuration to the live stream.
  fn update_config(&self, config: &CaptureConfig) -> PinResult<()>;

  /// Request termination. `on_stopped` runs once the stream has fully shut
  /// down and any frames already in flight have drained.
  fn stop(self: Box<Self>, on_stopped: Box<dyn FnOnce() + Send>);
}

/// The mirror window + unpin button window pair.
///
/// All frames are in bottom-left-origin coordinates; the core performs the
/// conversion (it knows which screen the mirror is on).
pub trait OverlaySurface: Send {
  /// Order both windows in, above all application windows.
  fn show(&self);

  /// Move/resize both windows. No animation.
  fn set_frames(&self, mirror: Bounds, button: Bounds);

  /// When enabled the mirror ignores pointer events so clicks reach the
  /// window underneath. Never affects the unpin button window.
  fn set_click_through(&self, click_through: bool);

  fn set_shadow(&self, shadow: bool);

  /// Opacity of the hosted display sink layer, in [0.0, 1.0].
  fn set_sink_opacity(&self, opacity: f64);

  /// Host the capture session's sink as the mirror's background layer.
  fn attach_sink(&self, sink: &DisplaySink);

  /// Detach the hosted sink from the layer hierarchy.
  fn detach_sink(&self);

  /// Hide both windows without closing them.
  fn order_out(&self);
}

/// Handle to a platform event subscription. Unsubscribes on drop.
pub trait Subscription: Send {}

/// Platform-global operations: permissions, window server queries, capture,
/// overlay windows, and event subscriptions.
pub trait Platform: Send + Sync + 'static {
  /// Side-effect-free check whether screen capture is permitted.
  fn preflight_capture_access(&self) -> bool;

  /// Trigger the system capture prompt (first time only) and register the
  /// app in the Screen Recording permission list. Non-blocking.
  fn request_capture_access(&self);

  /// Non-prompting check whether accessibility is granted.
  fn accessibility_trusted(&self) -> bool;

  /// Trigger the user-facing accessibility prompt. Non-blocking.
  fn request_accessibility_trust(&self);

  /// Open the privacy settings pane for screen capture.
  fn open_capture_settings(&self);

  /// All on-screen windows, front-to-back in z-order, unfiltered.
  fn window_list(&self) -> Vec<RawWindow>;

  fn displays(&self) -> Vec<DisplayInfo>;

  /// Bring the application owning `pid` to the foreground.
  fn activate_app(&self, pid: ProcessId);

  /// Window identifiers currently eligible for capture.
  ///
  /// Fails with `PermissionDenied` when capture access is missing.
  fn shareable_window_ids(&self) -> PinResult<Vec<WindowId>>;

  /// Open a live capture stream restricted to the target window,
  /// delivering validated frames into `sink`.
  fn open_stream(
    &self,
    target: &TargetDescriptor,
    config: &CaptureConfig,
    sink: DisplaySink,
  ) -> PinResult<Box<dyn CaptureStream>>;

  /// Create the (hidden) overlay window pair. Unpin clicks are reported
  /// through `events`.
  fn create_overlay(&self, events: Arc<dyn EventSink>) -> PinResult<Box<dyn OverlaySurface>>;

  /// Observe foreground-application changes.
  fn watch_frontmost(&self, events: Arc<dyn EventSink>) -> Box<dyn Subscription>;

  /// Observe global pointer movement.
  fn watch_pointer(&self, events: Arc<dyn EventSink>) -> Box<dyn Subscription>;
}
