/*!
Scripted platform double for state-machine tests.

The window table, displays, permissions, and shareable-content list are
all settable; overlay surfaces and capture streams record every call so
tests can assert on presentation state and teardown ordering.
*/

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::capture::{CaptureConfig, DisplaySink, FrameInfo};
use crate::types::{
  Bounds, Permission, PinError, PinResult, ProcessId, TargetDescriptor, WindowId,
};

use super::traits::{
  CaptureStream, DisplayInfo, EventSink, OverlaySurface, Platform, RawWindow, Subscription,
};

type EventLog = Arc<Mutex<Vec<String>>>;

/// Recorded state of one overlay window pair.
#[derive(Debug, Default)]
pub(crate) struct MockOverlay {
  pub visible: AtomicBool,
  pub ordered_out: AtomicBool,
  pub click_through: AtomicBool,
  pub shadow: AtomicBool,
  pub sink_opacity: Mutex<f64>,
  pub mirror_frame: Mutex<Option<Bounds>>,
  pub button_frame: Mutex<Option<Bounds>>,
  pub attached_sink: Mutex<Option<DisplaySink>>,
}

struct MockOverlayHandle {
  state: Arc<MockOverlay>,
  log: EventLog,
  index: usize,
}

impl OverlaySurface for MockOverlayHandle {
  fn show(&self) {
    self.state.visible.store(true, Ordering::SeqCst);
    self.log.lock().push(format!("overlay-show#{}", self.index));
  }

  fn set_frames(&self, mirror: Bounds, button: Bounds) {
    *self.state.mirror_frame.lock() = Some(mirror);
    *self.state.button_frame.lock() = Some(button);
  }

  fn set_click_through(&self, click_through: bool) {
    self.state.click_through.store(click_through, Ordering::SeqCst);
  }

  fn set_shadow(&self, shadow: bool) {
    self.state.shadow.store(shadow, Ordering::SeqCst);
  }

  fn set_sink_opacity(&self, opacity: f64) {
    *self.state.sink_opacity.lock() = opacity;
  }

  fn attach_sink(&self, sink: &DisplaySink) {
    *self.state.attached_sink.lock() = Some(sink.clone());
  }

  fn detach_sink(&self) {
    if let Some(sink) = self.state.attached_sink.lock().take() {
      sink.set_attached(false);
    }
    self
      .log
      .lock()
      .push(format!("overlay-detach-sink#{}", self.index));
  }

  fn order_out(&self) {
    self.state.visible.store(false, Ordering::SeqCst);
    self.state.ordered_out.store(true, Ordering::SeqCst);
    self
      .log
      .lock()
      .push(format!("overlay-order-out#{}", self.index));
  }
}

/// Recorded state of one capture stream.
#[derive(Debug)]
pub(crate) struct MockStream {
  pub config: Mutex<CaptureConfig>,
  pub stopped: AtomicBool,
  pub sink: DisplaySink,
}

struct MockStreamHandle {
  state: Arc<MockStream>,
  log: EventLog,
  index: usize,
}

impl CaptureStream for MockStreamHandle {
  fn update_config(&self, config: &CaptureConfig) -> PinResult<()> {
    *self.state.config.lock() = *config;
    Ok(())
  }

  fn stop(self: Box<Self>, on_stopped: Box<dyn FnOnce() + Send>) {
    self.log.lock().push(format!("stream-stop#{}", self.index));
    let state = Arc::clone(&self.state);
    thread::spawn(move || {
      // Simulate in-flight frames draining on the delivery queue.
      thread::sleep(Duration::from_millis(20));
      state.stopped.store(true, Ordering::SeqCst);
      on_stopped();
    });
  }
}

struct MockSubscription {
  counter: Arc<AtomicUsize>,
}

impl Subscription for MockSubscription {}

impl Drop for MockSubscription {
  fn drop(&mut self) {
    self.counter.fetch_sub(1, Ordering::SeqCst);
  }
}

#[derive(Default)]
struct MockTables {
  windows: Vec<RawWindow>,
  displays: Vec<DisplayInfo>,
  /// `None` mirrors the window table.
  shareable: Option<Vec<WindowId>>,
  activated: Vec<ProcessId>,
  overlays: Vec<Arc<MockOverlay>>,
  streams: Vec<Arc<MockStream>>,
}

/// The scripted platform. Construct with [`MockPlatform::with_defaults`]
/// and hand the agent a clone of the `Arc`.
pub(crate) struct MockPlatform {
  tables: Mutex<MockTables>,
  log: EventLog,
  capture_access: AtomicBool,
  accessibility: AtomicBool,
  fail_stream: AtomicBool,
  capture_prompts: AtomicUsize,
  accessibility_prompts: AtomicUsize,
  settings_opened: AtomicUsize,
  pub(crate) frontmost_watchers: Arc<AtomicUsize>,
  pub(crate) pointer_watchers: Arc<AtomicUsize>,
}

impl MockPlatform {
  /// One 1920x1080 retina display, all permissions granted, no windows.
  pub(crate) fn with_defaults() -> Arc<Self> {
    Arc::new(Self {
      tables: Mutex::new(MockTables {
        displays: vec![DisplayInfo {
          frame: Bounds::new(0.0, 0.0, 1920.0, 1080.0),
          cocoa_frame: Bounds::new(0.0, 0.0, 1920.0, 1080.0),
          scale: 2.0,
          max_fps: 60.0,
        }],
        ..MockTables::default()
      }),
      log: Arc::new(Mutex::new(Vec::new())),
      capture_access: AtomicBool::new(true),
      accessibility: AtomicBool::new(true),
      fail_stream: AtomicBool::new(false),
      capture_prompts: AtomicUsize::new(0),
      accessibility_prompts: AtomicUsize::new(0),
      settings_opened: AtomicUsize::new(0),
      frontmost_watchers: Arc::new(AtomicUsize::new(0)),
      pointer_watchers: Arc::new(AtomicUsize::new(0)),
    })
  }

  pub(crate) fn event_log(&self) -> Vec<String> {
    self.log.lock().clone()
  }

  pub(crate) fn set_windows(&self, windows: Vec<RawWindow>) {
    self.tables.lock().windows = windows;
  }

  pub(crate) fn remove_window(&self, id: WindowId) {
    self.tables.lock().windows.retain(|w| w.window_id != id);
  }

  pub(crate) fn move_window(&self, id: WindowId, bounds: Bounds) {
    let mut tables = self.tables.lock();
    if let Some(w) = tables.windows.iter_mut().find(|w| w.window_id == id) {
      w.bounds = bounds;
    }
  }

  pub(crate) fn set_capture_access(&self, granted: bool) {
    self.capture_access.store(granted, Ordering::SeqCst);
  }

  pub(crate) fn set_accessibility(&self, granted: bool) {
    self.accessibility.store(granted, Ordering::SeqCst);
  }

  pub(crate) fn set_shareable(&self, ids: Option<Vec<WindowId>>) {
    self.tables.lock().shareable = ids;
  }

  pub(crate) fn set_fail_stream(&self, fail: bool) {
    self.fail_stream.store(fail, Ordering::SeqCst);
  }

  pub(crate) fn activated(&self) -> Vec<ProcessId> {
    self.tables.lock().activated.clone()
  }

  pub(crate) fn overlay(&self, index: usize) -> Option<Arc<MockOverlay>> {
    self.tables.lock().overlays.get(index).cloned()
  }

  pub(crate) fn latest_overlay(&self) -> Option<Arc<MockOverlay>> {
    self.tables.lock().overlays.last().cloned()
  }

  pub(crate) fn overlay_count(&self) -> usize {
    self.tables.lock().overlays.len()
  }

  pub(crate) fn latest_stream(&self) -> Option<Arc<MockStream>> {
    self.tables.lock().streams.last().cloned()
  }

  pub(crate) fn live_stream_count(&self) -> usize {
    self
      .tables
      .lock()
      .streams
      .iter()
      .filter(|s| !s.stopped.load(Ordering::SeqCst))
      .count()
  }

  pub(crate) fn capture_prompt_count(&self) -> usize {
    self.capture_prompts.load(Ordering::SeqCst)
  }

  pub(crate) fn accessibility_prompt_count(&self) -> usize {
    self.accessibility_prompts.load(Ordering::SeqCst)
  }

  pub(crate) fn settings_opened_count(&self) -> usize {
    self.settings_opened.load(Ordering::SeqCst)
  }
}

impl Platform for MockPlatform {
  fn preflight_capture_access(&self) -> bool {
    self.capture_access.load(Ordering::SeqCst)
  }

  fn request_capture_access(&self) {
    self.capture_prompts.fetch_add(1, Ordering::SeqCst);
  }

  fn accessibility_trusted(&self) -> bool {
    self.accessibility.load(Ordering::SeqCst)
  }

  fn request_accessibility_trust(&self) {
    self.accessibility_prompts.fetch_add(1, Ordering::SeqCst);
  }

  fn open_capture_settings(&self) {
    self.settings_opened.fetch_add(1, Ordering::SeqCst);
  }

  fn window_list(&self) -> Vec<RawWindow> {
    self.tables.lock().windows.clone()
  }

  fn displays(&self) -> Vec<DisplayInfo> {
    self.tables.lock().displays.clone()
  }

  fn activate_app(&self, pid: ProcessId) {
    self.tables.lock().activated.push(pid);
  }

  fn shareable_window_ids(&self) -> PinResult<Vec<WindowId>> {
    if !self.capture_access.load(Ordering::SeqCst) {
      return Err(PinError::PermissionDenied(Permission::Capture));
    }
    let tables = self.tables.lock();
    Ok(match &tables.shareable {
      Some(ids) => ids.clone(),
      None => tables.windows.iter().map(|w| w.window_id).collect(),
    })
  }

  fn open_stream(
    &self,
    _target: &TargetDescriptor,
    config: &CaptureConfig,
    sink: DisplaySink,
  ) -> PinResult<Box<dyn CaptureStream>> {
    if self.fail_stream.load(Ordering::SeqCst) {
      return Err(PinError::CaptureFailure("stream creation refused".into()));
    }
    // One frame arrives immediately, as a started stream would deliver.
    sink.submit(FrameInfo {
      width: config.width,
      height: config.height,
    });
    let state = Arc::new(MockStream {
      config: Mutex::new(*config),
      stopped: AtomicBool::new(false),
      sink,
    });
    let index = {
      let mut tables = self.tables.lock();
      tables.streams.push(Arc::clone(&state));
      tables.streams.len() - 1
    };
    self.log.lock().push(format!("stream-open#{index}"));
    Ok(Box::new(MockStreamHandle {
      state,
      log: Arc::clone(&self.log),
      index,
    }))
  }

  fn create_overlay(&self, _events: Arc<dyn EventSink>) -> PinResult<Box<dyn OverlaySurface>> {
    let state = Arc::new(MockOverlay::default());
    let index = {
      let mut tables = self.tables.lock();
      tables.overlays.push(Arc::clone(&state));
      tables.overlays.len() - 1
    };
    self.log.lock().push(format!("overlay-create#{index}"));
    Ok(Box::new(MockOverlayHandle {
      state,
      log: Arc::clone(&self.log),
      index,
    }))
  }

  fn watch_frontmost(&self, _events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
    self.frontmost_watchers.fetch_add(1, Ordering::SeqCst);
    Box::new(MockSubscription {
      counter: Arc::clone(&self.frontmost_watchers),
    })
  }

  fn watch_pointer(&self, _events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
    self.pointer_watchers.fetch_add(1, Ordering::SeqCst);
    Box::new(MockSubscription {
      counter: Arc::clone(&self.pointer_watchers),
    })
  }
}
