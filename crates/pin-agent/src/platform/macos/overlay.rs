/*!
The overlay window pair: a borderless floating mirror window hosting the
frame layer, and a small always-clickable unpin button window strictly
above it.

Both windows join all spaces and stay put during space transitions. The
mirror is non-opaque with a clear background so the frame layer is all
the user sees; teardown orders the windows out instead of closing them.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]

use std::sync::Arc;

use objc2::rc::Retained;
use objc2::runtime::NSObject;
use objc2::{define_class, msg_send, sel, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{
  NSBackingStoreType, NSButton, NSColor, NSWindow, NSWindowCollectionBehavior,
  NSWindowStyleMask,
};
use objc2_foundation::{NSObjectProtocol, NSPoint, NSRect, NSSize, NSString};
use objc2_quartz_core::CALayer;
use parking_lot::Mutex;

use crate::capture::DisplaySink;
use crate::types::{Bounds, PinResult};

use super::super::traits::{EventSink, OverlaySurface};
use super::main_thread::{run_on_main, run_on_main_sync, Mt};

/// `NSFloatingWindowLevel`; the button sits one above.
const MIRROR_WINDOW_LEVEL: isize = 3;
const BUTTON_WINDOW_LEVEL: isize = 4;

/// Where the capture delivery pushes frames. One per pin.
static FRAME_LAYER: Mutex<Option<Mt<Retained<CALayer>>>> = Mutex::new(None);

/// The sink of the unpin click. One per pin, like the windows themselves.
static UNPIN_EVENTS: Mutex<Option<Arc<dyn EventSink>>> = Mutex::new(None);

define_class!(
  #[unsafe(super(NSObject))]
  #[name = "PinUnpinTarget"]
  #[thread_kind = MainThreadOnly]
  struct UnpinTarget;

  unsafe impl NSObjectProtocol for UnpinTarget {}

  impl UnpinTarget {
    #[unsafe(method(unpinClicked:))]
    fn unpin_clicked(&self, _sender: *mut NSObject) {
      let events = UNPIN_EVENTS.lock().clone();
      if let Some(events) = events {
        events.unpin_clicked();
      }
    }
  }
);

impl UnpinTarget {
  fn new(mtm: MainThreadMarker) -> Retained<Self> {
    let alloc = Self::alloc(mtm);
    unsafe { msg_send![alloc, init] }
  }
}

fn borderless_window(mtm: MainThreadMarker, level: isize) -> Retained<NSWindow> {
  let frame = NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(1.0, 1.0));
  let window = unsafe {
    NSWindow::initWithContentRect_styleMask_backing_defer(
      mtm.alloc(),
      frame,
      NSWindowStyleMask::Borderless,
      NSBackingStoreType::Buffered,
      false,
    )
  };
  window.setLevel(level);
  window.setOpaque(false);
  window.setBackgroundColor(Some(unsafe { &NSColor::clearColor() }));
  window.setCollectionBehavior(
    NSWindowCollectionBehavior::CanJoinAllSpaces | NSWindowCollectionBehavior::Stationary,
  );
  // Ordering out must never trigger deallocation while an animation still
  // references the window.
  unsafe { window.setReleasedWhenClosed(false) };
  window
}

pub(super) struct MacOverlaySurface {
  mirror: Mt<Retained<NSWindow>>,
  button: Mt<Retained<NSWindow>>,
  sink_layer: Mt<Retained<CALayer>>,
  _button_target: Mt<Retained<UnpinTarget>>,
}

impl MacOverlaySurface {
  fn mirror_handle(&self) -> Mt<Retained<NSWindow>> {
    Mt(self.mirror.0.clone())
  }

  fn button_handle(&self) -> Mt<Retained<NSWindow>> {
    Mt(self.button.0.clone())
  }

  fn layer_handle(&self) -> Mt<Retained<CALayer>> {
    Mt(self.sink_layer.0.clone())
  }
}

pub(super) fn create_overlay(events: Arc<dyn EventSink>) -> PinResult<Box<dyn OverlaySurface>> {
  *UNPIN_EVENTS.lock() = Some(events);

  let surface = run_on_main_sync(|mtm| {
    let mirror = borderless_window(mtm, MIRROR_WINDOW_LEVEL);
    mirror.setHasShadow(true);

    let sink_layer = CALayer::new();
    if let Some(view) = mirror.contentView() {
      view.setWantsLayer(true);
      if let Some(root) = view.layer() {
        root.addSublayer(&sink_layer);
      }
    }

    let button = borderless_window(mtm, BUTTON_WINDOW_LEVEL);
    button.setHasShadow(false);
    button.setIgnoresMouseEvents(false);

    let target = UnpinTarget::new(mtm);
    let unpin = NSButton::buttonWithTitle_target_action(
      &NSString::from_str("\u{2715}"),
      Some(&target),
      Some(sel!(unpinClicked:)),
      mtm,
    );
    button.setContentView(Some(&unpin));

    Mt(MacOverlaySurface {
      mirror: Mt(mirror),
      button: Mt(button),
      sink_layer: Mt(sink_layer),
      _button_target: Mt(target),
    })
  });

  Ok(Box::new(surface.0))
}

impl OverlaySurface for MacOverlaySurface {
  fn show(&self) {
    let mirror = self.mirror_handle();
    let button = self.button_handle();
    run_on_main(move |_mtm| {
      mirror.orderFrontRegardless();
      button.orderFrontRegardless();
    });
  }

  fn set_frames(&self, mirror_frame: Bounds, button_frame: Bounds) {
    let mirror = self.mirror_handle();
    let button = self.button_handle();
    let layer = self.layer_handle();
    run_on_main(move |_mtm| {
      let to_rect = |b: Bounds| NSRect::new(NSPoint::new(b.x, b.y), NSSize::new(b.w, b.h));
      unsafe {
        mirror.setFrame_display(to_rect(mirror_frame), true);
        button.setFrame_display(to_rect(button_frame), true);
      }
      if let Some(view) = mirror.contentView() {
        layer.setFrame(view.bounds());
      }
    });
  }

  fn set_click_through(&self, click_through: bool) {
    let mirror = self.mirror_handle();
    run_on_main(move |_mtm| {
      mirror.setIgnoresMouseEvents(click_through);
    });
  }

  fn set_shadow(&self, shadow: bool) {
    let mirror = self.mirror_handle();
    run_on_main(move |_mtm| {
      mirror.setHasShadow(shadow);
    });
  }

  fn set_sink_opacity(&self, opacity: f64) {
    let layer = self.layer_handle();
    run_on_main(move |_mtm| {
      layer.setOpacity(opacity as f32);
    });
  }

  fn attach_sink(&self, _sink: &DisplaySink) {
    *FRAME_LAYER.lock() = Some(self.layer_handle());
  }

  fn detach_sink(&self) {
    *FRAME_LAYER.lock() = None;
    let layer = self.layer_handle();
    run_on_main(move |_mtm| {
      layer.removeFromSuperlayer();
    });
  }

  fn order_out(&self) {
    *UNPIN_EVENTS.lock() = None;
    let mirror = self.mirror_handle();
    let button = self.button_handle();
    run_on_main(move |_mtm| {
      if let Some(view) = button.contentView() {
        unsafe { view.removeFromSuperview() };
      }
      button.orderOut(None);
      mirror.orderOut(None);
    });
  }
}

/// Push a delivered frame surface into the mirror's layer, if one is
/// attached. Called from the capture delivery queue.
pub(super) fn render_frame(contents: Mt<Retained<objc2::runtime::AnyObject>>) {
  let layer = {
    let guard = FRAME_LAYER.lock();
    match guard.as_ref() {
      Some(layer) => Mt(layer.0.clone()),
      None => return,
    }
  };
  run_on_main(move |_mtm| unsafe {
    let () = msg_send![&*layer.0, setContents: &*contents.0];
  });
}
