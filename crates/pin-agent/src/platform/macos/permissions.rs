/*! Screen-capture and accessibility permission checks. */

#![allow(unsafe_code)]

use objc2_app_kit::NSWorkspace;
use objc2_core_foundation::{CFBoolean, CFDictionary, CFString};
use objc2_core_graphics::{CGPreflightScreenCaptureAccess, CGRequestScreenCaptureAccess};
use objc2_foundation::{NSString, NSURL};

use super::main_thread::run_on_main;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
  fn AXIsProcessTrusted() -> bool;
  fn AXIsProcessTrustedWithOptions(options: *const CFDictionary) -> bool;
}

const SCREEN_CAPTURE_SETTINGS_URL: &str =
  "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture";

/// Side-effect-free query of screen-capture access.
pub(super) fn preflight_capture_access() -> bool {
  unsafe { CGPreflightScreenCaptureAccess() }
}

/// Trigger the system capture prompt (first run) or no-op if the user has
/// already decided. Either way the app lands in the Screen Recording list.
pub(super) fn request_capture_access() {
  let granted = unsafe { CGRequestScreenCaptureAccess() };
  if !granted {
    log::debug!("screen capture access not granted after request");
  }
}

/// Non-prompting accessibility check.
pub(super) fn accessibility_trusted() -> bool {
  unsafe { AXIsProcessTrusted() }
}

/// Show the accessibility prompt. Returns immediately.
pub(super) fn request_accessibility_trust() {
  let key = CFString::from_static_str("AXTrustedCheckOptionPrompt");
  let value = CFBoolean::new(true);
  unsafe {
    let options = CFDictionary::from_slices(&[&*key], &[&*value]);
    AXIsProcessTrustedWithOptions(&*options);
  }
}

/// Open the Screen Recording pane of Privacy & Security.
pub(super) fn open_capture_settings() {
  run_on_main(|_mtm| {
    let url_string = NSString::from_str(SCREEN_CAPTURE_SETTINGS_URL);
    if let Some(url) = unsafe { NSURL::URLWithString(&url_string) } {
      let opened = unsafe { NSWorkspace::sharedWorkspace().openURL(&url) };
      if !opened {
        log::warn!("could not open screen capture settings pane");
      }
    }
  });
}
