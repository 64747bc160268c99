/*! Connected display information.

`NSScreen` frames are bottom-left-origin; the top-left-origin variant the
rest of the agent works in is derived against the primary screen (the one
containing the global origin).
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_precision_loss)]

use objc2_app_kit::NSScreen;
use objc2_foundation::NSUInteger;

use crate::types::Bounds;

use super::super::traits::DisplayInfo;
use super::main_thread::run_on_main_sync;

pub(super) fn displays() -> Vec<DisplayInfo> {
  run_on_main_sync(|mtm| {
    let screens = NSScreen::screens(mtm);
    let count = screens.count() as usize;
    if count == 0 {
      return Vec::new();
    }

    // The primary screen anchors the flipped coordinate space.
    let primary = screens.objectAtIndex(0);
    let primary_height = primary.frame().size.height;

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
      let screen = screens.objectAtIndex(i as NSUInteger);
      let frame = screen.frame();
      let cocoa = Bounds::new(
        frame.origin.x,
        frame.origin.y,
        frame.size.width,
        frame.size.height,
      );
      let top_left = Bounds {
        y: primary_height - (cocoa.y + cocoa.h),
        ..cocoa
      };
      out.push(DisplayInfo {
        frame: top_left,
        cocoa_frame: cocoa,
        scale: screen.backingScaleFactor(),
        max_fps: screen.maximumFramesPerSecond() as f64,
      });
    }
    out
  })
}
