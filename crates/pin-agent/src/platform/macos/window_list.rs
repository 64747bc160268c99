/*! Window enumeration for macOS.

Uses `CGWindowListCopyWindowInfo` to enumerate on-screen windows,
front-to-back. Safe to call from any thread.
*/

#![allow(unsafe_code)]
#![allow(
  clippy::cast_possible_truncation,
  clippy::cast_sign_loss,
  clippy::cast_possible_wrap
)]

use std::ffi::c_void;
use std::ptr::NonNull;

use objc2_app_kit::NSRunningApplication;
use objc2_core_foundation::{
  CFArray, CFBoolean, CFDictionary, CFNumber, CFNumberType, CFRetained, CFString, CGRect,
};
use objc2_core_graphics::{
  kCGNullWindowID, CGRectMakeWithDictionaryRepresentation, CGWindowListCopyWindowInfo,
  CGWindowListOption,
};

use crate::types::{Bounds, ProcessId, WindowId};

use super::super::traits::RawWindow;

/// Enumerate all on-screen windows, frontmost first.
pub(super) fn enumerate_windows() -> Vec<RawWindow> {
  // Wrap in an autorelease pool so per-window CF objects do not pile up.
  objc2::rc::autoreleasepool(|_pool| enumerate_windows_inner())
}

fn enumerate_windows_inner() -> Vec<RawWindow> {
  let option = CGWindowListOption::OptionOnScreenOnly | CGWindowListOption::ExcludeDesktopElements;
  let Some(info) = CGWindowListCopyWindowInfo(option, kCGNullWindowID) else {
    return Vec::new();
  };

  (0..CFArray::count(&info))
    .filter_map(|idx| WindowDict::at_index(&info, idx))
    .filter_map(|dict| raw_window(&dict))
    .collect()
}

fn raw_window(dict: &WindowDict) -> Option<RawWindow> {
  let window_id: i32 = dict.get("kCGWindowNumber")?;
  let process_id: i32 = dict.get("kCGWindowOwnerPID")?;
  if window_id == 0 || process_id == 0 {
    return None;
  }
  let bounds: Bounds = dict.get("kCGWindowBounds")?;

  Some(RawWindow {
    window_id: WindowId(window_id as u32),
    process_id: ProcessId(process_id as u32),
    owner_name: dict.get("kCGWindowOwnerName").unwrap_or_default(),
    title: dict.get::<String>("kCGWindowName").filter(|t| !t.is_empty()),
    bounds,
    layer: dict.get("kCGWindowLayer").unwrap_or_default(),
    on_screen: dict.get("kCGWindowIsOnscreen").unwrap_or_default(),
    bundle_id: bundle_identifier(process_id as u32),
  })
}

fn bundle_identifier(pid: u32) -> Option<String> {
  let app: *mut NSRunningApplication = unsafe {
    objc2::msg_send![
      objc2::class!(NSRunningApplication),
      runningApplicationWithProcessIdentifier: pid as i32
    ]
  };
  if app.is_null() {
    return None;
  }
  unsafe { (*app).bundleIdentifier() }.map(|s| s.to_string())
}

/// One retained window-info dictionary with typed key access.
struct WindowDict(CFRetained<CFDictionary>);

impl WindowDict {
  fn at_index(array: &CFArray, idx: isize) -> Option<Self> {
    let ptr = unsafe { CFArray::value_at_index(array, idx) }
      .cast::<CFDictionary>()
      .cast_mut();
    NonNull::new(ptr).map(|ptr| Self(unsafe { CFRetained::retain(ptr) }))
  }

  /// Typed lookup; `None` for a missing key or a value of the wrong shape.
  fn get<T: FromDictValue>(&self, key: &str) -> Option<T> {
    let key = CFString::from_str(key);
    let key_ptr = (key.as_ref() as *const CFString).cast();
    unsafe {
      if !CFDictionary::contains_ptr_key(&self.0, key_ptr) {
        return None;
      }
      T::from_value_ptr(CFDictionary::value(&self.0, key_ptr))
    }
  }
}

/// Decodes one CF value kind out of a window-info dictionary.
trait FromDictValue: Sized {
  /// # Safety
  ///
  /// `ptr` must be null or point to a live CF object of the kind the
  /// window server documents for the key being read.
  unsafe fn from_value_ptr(ptr: *const c_void) -> Option<Self>;
}

impl FromDictValue for i32 {
  unsafe fn from_value_ptr(ptr: *const c_void) -> Option<Self> {
    let number = unsafe { ptr.cast::<CFNumber>().as_ref() }?;
    let mut out: i32 = 0;
    let converted = unsafe {
      CFNumber::value(number, CFNumberType::IntType, (&raw mut out).cast::<c_void>())
    };
    converted.then_some(out)
  }
}

impl FromDictValue for bool {
  unsafe fn from_value_ptr(ptr: *const c_void) -> Option<Self> {
    unsafe { ptr.cast::<CFBoolean>().as_ref() }.map(CFBoolean::value)
  }
}

impl FromDictValue for String {
  unsafe fn from_value_ptr(ptr: *const c_void) -> Option<Self> {
    unsafe { ptr.cast::<CFString>().as_ref() }.map(CFString::to_string)
  }
}

impl FromDictValue for Bounds {
  unsafe fn from_value_ptr(ptr: *const c_void) -> Option<Self> {
    let rect_dict = unsafe { ptr.cast::<CFDictionary>().as_ref() }?;
    let mut rect = CGRect::default();
    let converted = CGRectMakeWithDictionaryRepresentation(Some(rect_dict), &raw mut rect);
    converted.then(|| {
      Bounds::new(
        rect.origin.x,
        rect.origin.y,
        rect.size.width,
        rect.size.height,
      )
    })
  }
}
