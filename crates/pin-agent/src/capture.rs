/*!
Live capture session for a single target window.

The session owns the platform stream handle and the display sink the
overlay hosts. Teardown is deferred: `stop()` only requests termination,
and all final cleanup happens in the stream's completion callback so that
frames already in flight drain first. A `stop_pending` flag refuses new
starts until that callback has run; callers never block on it.
*/

use std::sync::Arc;

use parking_lot::Mutex;

use crate::platform::{CaptureStream, DisplayInfo, Platform};
use crate::types::{Bounds, PinError, PinResult, TargetDescriptor, WindowId};

/// Frame rate assumed when the display does not report one.
const FALLBACK_FPS: f64 = 60.0;

/// Stream configuration derived from the target's geometry and display.
///
/// Pixel format is fixed: 32-bit BGRA in sRGB, cursor and audio capture
/// disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureConfig {
  /// Width in device pixels (content size × backing scale).
  pub width: u32,
  /// Height in device pixels.
  pub height: u32,
  /// Minimum seconds between frames (1 ÷ display max FPS).
  pub min_frame_interval: f64,
}

impl CaptureConfig {
  /// Compute the configuration for a target of `bounds` shown on `display`.
  pub fn for_bounds(bounds: &Bounds, display: &DisplayInfo) -> Self {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale_px = |points: f64| (points * display.scale).round().max(1.0) as u32;
    let fps = if display.max_fps > 0.0 {
      display.max_fps
    } else {
      FALLBACK_FPS
    };
    Self {
      width: scale_px(bounds.w),
      height: scale_px(bounds.h),
      min_frame_interval: 1.0 / fps,
    }
  }
}

/// Dimensions of a delivered pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
  pub width: u32,
  pub height: u32,
}

#[derive(Debug)]
struct SinkState {
  frames_received: u64,
  latest: Option<FrameInfo>,
  opacity: f64,
  attached: bool,
}

/// Layer-like frame destination owned by the capture session and hosted by
/// the overlay. Clone is cheap; all clones share state.
///
/// On session stop the sink is detached and replaced by a fresh instance so
/// the next start begins clean.
#[derive(Clone)]
pub struct DisplaySink {
  state: Arc<Mutex<SinkState>>,
}

impl std::fmt::Debug for DisplaySink {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DisplaySink").finish_non_exhaustive()
  }
}

impl Default for DisplaySink {
  fn default() -> Self {
    Self::new()
  }
}

impl DisplaySink {
  pub fn new() -> Self {
    Self {
      state: Arc::new(Mutex::new(SinkState {
        frames_received: 0,
        latest: None,
        opacity: 1.0,
        attached: false,
      })),
    }
  }

  /// Accept a frame from the stream. Zero-sized buffers are invalid and
  /// dropped.
  pub fn submit(&self, frame: FrameInfo) {
    if frame.width == 0 || frame.height == 0 {
      log::debug!("dropping invalid {}x{} frame", frame.width, frame.height);
      return;
    }
    let mut state = self.state.lock();
    state.frames_received += 1;
    state.latest = Some(frame);
  }

  pub fn frames_received(&self) -> u64 {
    self.state.lock().frames_received
  }

  pub fn latest_frame(&self) -> Option<FrameInfo> {
    self.state.lock().latest
  }

  pub fn opacity(&self) -> f64 {
    self.state.lock().opacity
  }

  pub(crate) fn set_opacity(&self, opacity: f64) {
    self.state.lock().opacity = opacity;
  }

  pub(crate) fn set_attached(&self, attached: bool) {
    self.state.lock().attached = attached;
  }

  pub fn is_attached(&self) -> bool {
    self.state.lock().attached
  }
}

#[derive(Default)]
struct SessionInner {
  stream: Option<Box<dyn CaptureStream>>,
  sink: DisplaySink,
  target_id: Option<WindowId>,
  capturing: bool,
  capture_error: bool,
  stop_pending: bool,
}

/// A per-pin capture session. Clone is cheap; all clones share state.
#[derive(Clone)]
pub struct CaptureSession {
  inner: Arc<Mutex<SessionInner>>,
}

impl std::fmt::Debug for CaptureSession {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CaptureSession").finish_non_exhaustive()
  }
}

impl Default for CaptureSession {
  fn default() -> Self {
    Self::new()
  }
}

impl CaptureSession {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(SessionInner::default())),
    }
  }

  /// The sink the overlay should host. Replaced by a fresh instance after
  /// every completed stop.
  pub fn sink(&self) -> DisplaySink {
    self.inner.lock().sink.clone()
  }

  pub fn is_capturing(&self) -> bool {
    self.inner.lock().capturing
  }

  pub fn has_error(&self) -> bool {
    self.inner.lock().capture_error
  }

  pub fn stop_pending(&self) -> bool {
    self.inner.lock().stop_pending
  }

  /// Open the stream for `target`. Idempotent when already capturing the
  /// same window. Refused while a previous stop has not completed.
  pub fn start(
    &self,
    platform: &Arc<dyn Platform>,
    target: &TargetDescriptor,
    display: &DisplayInfo,
  ) -> PinResult<()> {
    let mut inner = self.inner.lock();
    if inner.stop_pending {
      return Err(PinError::CaptureFailure(
        "previous session still stopping".into(),
      ));
    }
    if inner.capturing && inner.target_id == Some(target.window_id) {
      return Ok(());
    }

    let config = CaptureConfig::for_bounds(&target.bounds, display);
    let sink = inner.sink.clone();
    match platform.open_stream(target, &config, sink) {
      Ok(stream) => {
        inner.stream = Some(stream);
        inner.target_id = Some(target.window_id);
        inner.capturing = true;
        inner.capture_error = false;
        Ok(())
      }
      Err(e) => {
        inner.capture_error = true;
        inner.capturing = false;
        Err(e)
      }
    }
  }

  /// Reconfigure the live stream for new bounds or a new display. Errors
  /// are logged but never tear the session down.
  pub fn resize(&self, bounds: &Bounds, display: &DisplayInfo) {
    let inner = self.inner.lock();
    let Some(stream) = inner.stream.as_ref() else {
      return;
    };
    let config = CaptureConfig::for_bounds(bounds, display);
    if let Err(e) = stream.update_config(&config) {
      log::warn!("stream reconfigure failed: {e}");
    }
  }

  /// Request termination. Returns immediately; flags are reset and the
  /// sink replaced only in the stream's completion callback, after which
  /// `on_stopped` runs.
  pub fn stop(&self, on_stopped: impl FnOnce() + Send + 'static) {
    let stream = {
      let mut inner = self.inner.lock();
      match inner.stream.take() {
        Some(stream) => {
          inner.stop_pending = true;
          stream
        }
        None => {
          // Nothing running: complete right away.
          inner.capturing = false;
          inner.capture_error = false;
          inner.target_id = None;
          drop(inner);
          on_stopped();
          return;
        }
      }
    };

    let shared = Arc::clone(&self.inner);
    stream.stop(Box::new(move || {
      {
        let mut inner = shared.lock();
        inner.capturing = false;
        inner.capture_error = false;
        inner.target_id = None;
        inner.sink.set_attached(false);
        inner.sink = DisplaySink::new();
        inner.stop_pending = false;
      }
      on_stopped();
    }));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn display(scale: f64, max_fps: f64) -> DisplayInfo {
    DisplayInfo {
      frame: Bounds::new(0.0, 0.0, 1920.0, 1080.0),
      cocoa_frame: Bounds::new(0.0, 0.0, 1920.0, 1080.0),
      scale,
      max_fps,
    }
  }

  mod config {
    use super::*;

    #[test]
    fn scales_points_to_device_pixels() {
      let config = CaptureConfig::for_bounds(&Bounds::new(0.0, 0.0, 800.0, 600.0), &display(2.0, 120.0));
      assert_eq!(config.width, 1600);
      assert_eq!(config.height, 1200);
      assert!((config.min_frame_interval - 1.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn falls_back_to_sixty_fps() {
      let config = CaptureConfig::for_bounds(&Bounds::new(0.0, 0.0, 100.0, 100.0), &display(1.0, 0.0));
      assert!((config.min_frame_interval - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn never_produces_zero_dimensions() {
      let config = CaptureConfig::for_bounds(&Bounds::new(0.0, 0.0, 0.2, 0.2), &display(1.0, 60.0));
      assert_eq!(config.width, 1);
      assert_eq!(config.height, 1);
    }
  }

  mod session {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::types::{ProcessId, TargetDescriptor, WindowId};
    use std::sync::Arc;
    use std::time::Duration;

    fn target() -> TargetDescriptor {
      TargetDescriptor {
        window_id: WindowId(7),
        process_id: ProcessId(70),
        app_name: "Editor".into(),
        window_title: None,
        bounds: Bounds::new(0.0, 0.0, 400.0, 300.0),
      }
    }

    #[test]
    fn start_is_idempotent_for_same_target() {
      let mock = MockPlatform::with_defaults();
      let platform: Arc<dyn Platform> = mock.clone();
      let session = CaptureSession::new();

      session.start(&platform, &target(), &display(2.0, 60.0)).unwrap();
      session.start(&platform, &target(), &display(2.0, 60.0)).unwrap();

      assert_eq!(mock.live_stream_count(), 1);
      assert!(session.is_capturing());
      assert!(!session.has_error());
    }

    #[test]
    fn failed_start_sets_error_flag() {
      let mock = MockPlatform::with_defaults();
      mock.set_fail_stream(true);
      let platform: Arc<dyn Platform> = mock.clone();
      let session = CaptureSession::new();

      assert!(session.start(&platform, &target(), &display(1.0, 60.0)).is_err());
      assert!(session.has_error());
      assert!(!session.is_capturing());
    }

    #[test]
    fn stop_defers_cleanup_to_completion() {
      let mock = MockPlatform::with_defaults();
      let platform: Arc<dyn Platform> = mock.clone();
      let session = CaptureSession::new();
      session.start(&platform, &target(), &display(2.0, 60.0)).unwrap();

      let old_sink = session.sink();
      old_sink.set_attached(true);

      let (tx, rx) = std::sync::mpsc::channel();
      session.stop(move || {
        drop(tx.send(()));
      });

      // Until the stream's completion runs, no new start is accepted.
      assert!(session.stop_pending());
      assert!(session.start(&platform, &target(), &display(2.0, 60.0)).is_err());

      rx.recv_timeout(Duration::from_secs(1)).unwrap();
      assert!(!session.stop_pending());
      assert!(!session.is_capturing());
      // The old sink was detached and replaced by a fresh one.
      assert!(!old_sink.is_attached());
      assert_eq!(session.sink().frames_received(), 0);
      session.start(&platform, &target(), &display(2.0, 60.0)).unwrap();
    }

    #[test]
    fn stop_without_stream_completes_immediately() {
      let session = CaptureSession::new();
      let (tx, rx) = std::sync::mpsc::channel();
      session.stop(move || {
        drop(tx.send(()));
      });
      rx.recv_timeout(Duration::from_millis(100)).unwrap();
      assert!(!session.stop_pending());
    }
  }

  mod sink {
    use super::*;

    #[test]
    fn counts_valid_frames() {
      let sink = DisplaySink::new();
      sink.submit(FrameInfo {
        width: 10,
        height: 10,
      });
      sink.submit(FrameInfo {
        width: 12,
        height: 8,
      });
      assert_eq!(sink.frames_received(), 2);
      assert_eq!(
        sink.latest_frame(),
        Some(FrameInfo {
          width: 12,
          height: 8
        })
      );
    }

    #[test]
    fn drops_zero_sized_frames() {
      let sink = DisplaySink::new();
      sink.submit(FrameInfo {
        width: 0,
        height: 10,
      });
      assert_eq!(sink.frames_received(), 0);
      assert_eq!(sink.latest_frame(), None);
    }

    #[test]
    fn clones_share_state() {
      let sink = DisplaySink::new();
      let clone = sink.clone();
      clone.set_opacity(0.3);
      assert!((sink.opacity() - 0.3).abs() < 1e-9);
    }
  }
}
