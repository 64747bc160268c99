/*! Foreground-application observation and activation via `NSWorkspace`. */

#![allow(unsafe_code)]
#![allow(clippy::cast_sign_loss)]

use std::ptr::NonNull;
use std::sync::Arc;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::NSObject;
use objc2_app_kit::{
  NSApplicationActivationOptions, NSRunningApplication, NSWorkspace,
  NSWorkspaceApplicationKey, NSWorkspaceDidActivateApplicationNotification,
};
use objc2_foundation::NSNotification;

use crate::types::ProcessId;

use super::super::traits::{EventSink, Subscription};
use super::main_thread::{run_on_main, run_on_main_sync, Mt};

/// Bring the application owning `pid` to the foreground.
pub(super) fn activate_app(pid: ProcessId) {
  run_on_main(move |_mtm| {
    let app: *mut NSRunningApplication = unsafe {
      objc2::msg_send![
        objc2::class!(NSRunningApplication),
        runningApplicationWithProcessIdentifier: pid.0 as i32
      ]
    };
    if app.is_null() {
      log::debug!("activate: no running application for pid {pid}");
      return;
    }
    unsafe {
      (*app).activateWithOptions(NSApplicationActivationOptions::ActivateIgnoringOtherApps);
    }
  });
}

struct FrontmostSubscription {
  token: Option<Mt<Retained<NSObject>>>,
}

impl Subscription for FrontmostSubscription {}

impl Drop for FrontmostSubscription {
  fn drop(&mut self) {
    if let Some(token) = self.token.take() {
      run_on_main(move |_mtm| {
        let center = unsafe { NSWorkspace::sharedWorkspace().notificationCenter() };
        unsafe { center.removeObserver(&token.0) };
      });
    }
  }
}

/// Observe foreground-application changes; each change reports the new
/// frontmost pid to `events`.
pub(super) fn watch_frontmost(events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
  let token = run_on_main_sync(move |_mtm| {
    let block = RcBlock::new(move |notification: NonNull<NSNotification>| {
      let notification = unsafe { notification.as_ref() };
      let Some(user_info) = (unsafe { notification.userInfo() }) else {
        return;
      };
      let Some(app) = user_info.objectForKey(unsafe { NSWorkspaceApplicationKey }) else {
        return;
      };
      let Ok(app) = app.downcast::<NSRunningApplication>() else {
        return;
      };
      let pid = unsafe { app.processIdentifier() };
      if pid > 0 {
        events.frontmost_app_changed(ProcessId(pid as u32));
      }
    });

    let center = unsafe { NSWorkspace::sharedWorkspace().notificationCenter() };
    let token = unsafe {
      center.addObserverForName_object_queue_usingBlock(
        Some(NSWorkspaceDidActivateApplicationNotification),
        None,
        None,
        &block,
      )
    };
    Mt(token)
  });

  Box::new(FrontmostSubscription {
    token: Some(token),
  })
}
