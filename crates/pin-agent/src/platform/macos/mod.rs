/*!
macOS platform implementation.

Window enumeration via `CGWindowListCopyWindowInfo`, capture via
ScreenCaptureKit, overlay windows via AppKit, frontmost-app observation
via `NSWorkspace`, and global pointer monitoring via `NSEvent`.

AppKit is main-thread-only; everything that touches windows or screens is
marshalled through `main_thread`.
*/

mod capture;
mod main_thread;
mod overlay;
mod permissions;
mod pointer;
mod screens;
mod window_list;
mod workspace;

use std::sync::Arc;

use crate::capture::{CaptureConfig, DisplaySink};
use crate::types::{PinResult, ProcessId, TargetDescriptor, WindowId};

use super::traits::{
  CaptureStream, DisplayInfo, EventSink, OverlaySurface, Platform, RawWindow, Subscription,
};

/// The production [`Platform`] for macOS.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacPlatform;

impl MacPlatform {
  pub fn new() -> Self {
    Self
  }
}

impl Platform for MacPlatform {
  fn preflight_capture_access(&self) -> bool {
    permissions::preflight_capture_access()
  }

  fn request_capture_access(&self) {
    permissions::request_capture_access();
  }

  fn accessibility_trusted(&self) -> bool {
    permissions::accessibility_trusted()
  }

  fn request_accessibility_trust(&self) {
    permissions::request_accessibility_trust();
  }

  fn open_capture_settings(&self) {
    permissions::open_capture_settings();
  }

  fn window_list(&self) -> Vec<RawWindow> {
    window_list::enumerate_windows()
  }

  fn displays(&self) -> Vec<DisplayInfo> {
    screens::displays()
  }

  fn activate_app(&self, pid: ProcessId) {
    workspace::activate_app(pid);
  }

  fn shareable_window_ids(&self) -> PinResult<Vec<WindowId>> {
    capture::shareable_window_ids()
  }

  fn open_stream(
    &self,
    target: &TargetDescriptor,
    config: &CaptureConfig,
    sink: DisplaySink,
  ) -> PinResult<Box<dyn CaptureStream>> {
    capture::open_stream(target, config, sink)
  }

  fn create_overlay(&self, events: Arc<dyn EventSink>) -> PinResult<Box<dyn OverlaySurface>> {
    overlay::create_overlay(events)
  }

  fn watch_frontmost(&self, events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
    workspace::watch_frontmost(events)
  }

  fn watch_pointer(&self, events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
    pointer::watch_pointer(events)
  }
}
