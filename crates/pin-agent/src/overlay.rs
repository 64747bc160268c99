/*!
Overlay controller: geometry synchronization and see-through presentation
for the mirror/unpin window pair.

The platform owns the actual windows behind [`OverlaySurface`]; this
controller owns every decision about them: where they sit (including the
top-left to bottom-left coordinate conversion against the screen that
contains the mirror), how the hidden mode looks, and the teardown order.
*/

use crate::capture::DisplaySink;
use crate::platform::{DisplayInfo, OverlaySurface};
use crate::types::Bounds;

/// Side length of the unpin button window, in points.
const UNPIN_BUTTON_SIZE: f64 = 24.0;

/// Offset of the unpin button from the mirror's top-left corner.
const UNPIN_BUTTON_OFFSET: f64 = 8.0;

/// Unpin button frame in top-left-origin coordinates, anchored to the
/// mirror's top-left corner.
fn button_frame_for(mirror: &Bounds) -> Bounds {
  Bounds::new(
    mirror.x + UNPIN_BUTTON_OFFSET,
    mirror.y + UNPIN_BUTTON_OFFSET,
    UNPIN_BUTTON_SIZE,
    UNPIN_BUTTON_SIZE,
  )
}

/// The display whose frame overlaps `bounds` the most, falling back to the
/// first (primary) display.
pub(crate) fn display_for<'a>(
  bounds: &Bounds,
  displays: &'a [DisplayInfo],
) -> Option<&'a DisplayInfo> {
  displays
    .iter()
    .filter(|d| d.frame.intersection_area(bounds) > 0.0)
    .max_by(|a, b| {
      let area_a = a.frame.intersection_area(bounds);
      let area_b = b.frame.intersection_area(bounds);
      area_a.total_cmp(&area_b)
    })
    .or_else(|| displays.first())
}

/// Drives one overlay window pair for the lifetime of a pin.
pub(crate) struct OverlayController {
  surface: Box<dyn OverlaySurface>,
  /// Last target bounds applied, top-left-origin.
  current_bounds: Bounds,
  /// Sink opacity restored when the mirror is shown again.
  visible_opacity: f64,
  hidden: bool,
}

impl std::fmt::Debug for OverlayController {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OverlayController")
      .field("current_bounds", &self.current_bounds)
      .field("hidden", &self.hidden)
      .finish_non_exhaustive()
  }
}

impl OverlayController {
  /// Place the windows over `bounds`, apply `opacity`, and order them in.
  pub(crate) fn present(
    surface: Box<dyn OverlaySurface>,
    bounds: Bounds,
    displays: &[DisplayInfo],
    opacity: f64,
  ) -> Self {
    let controller = Self {
      surface,
      current_bounds: bounds,
      visible_opacity: opacity,
      hidden: false,
    };
    controller.apply_frames(displays);
    controller.surface.set_sink_opacity(opacity);
    controller.surface.set_shadow(true);
    controller.surface.set_click_through(false);
    controller.surface.show();
    controller
  }

  pub(crate) fn attach_sink(&self, sink: &DisplaySink) {
    sink.set_attached(true);
    self.surface.attach_sink(sink);
  }

  /// Mirror the target's new bounds. Returns false when nothing moved.
  pub(crate) fn sync_geometry(&mut self, bounds: Bounds, displays: &[DisplayInfo]) -> bool {
    if bounds == self.current_bounds {
      return false;
    }
    self.current_bounds = bounds;
    self.apply_frames(displays);
    true
  }

  fn apply_frames(&self, displays: &[DisplayInfo]) {
    let mirror = self.current_bounds;
    let button = button_frame_for(&mirror);
    let (mirror, button) = match display_for(&mirror, displays) {
      Some(display) => (
        mirror.to_bottom_left(&display.frame, &display.cocoa_frame),
        button.to_bottom_left(&display.frame, &display.cocoa_frame),
      ),
      // No display to convert against: pass through unconverted rather
      // than hide the overlay entirely.
      None => (mirror, button),
    };
    self.surface.set_frames(mirror, button);
  }

  /// Enter or leave see-through mode. Hidden: the sink goes transparent,
  /// the mirror ignores pointer events, and shadows are removed. The
  /// window itself stays, so the unpin button remains stable.
  pub(crate) fn set_hidden(&mut self, hidden: bool) {
    self.hidden = hidden;
    if hidden {
      self.surface.set_sink_opacity(0.0);
      self.surface.set_click_through(true);
      self.surface.set_shadow(false);
    } else {
      self.surface.set_sink_opacity(self.visible_opacity);
      self.surface.set_click_through(false);
      self.surface.set_shadow(true);
    }
  }

  /// Change the persisted opacity. Applied immediately unless hidden.
  pub(crate) fn set_opacity(&mut self, opacity: f64) {
    self.visible_opacity = opacity;
    if !self.hidden {
      self.surface.set_sink_opacity(opacity);
    }
  }

  /// Dismantle the window pair. Order matters: the sink leaves the layer
  /// hierarchy first, then the windows are ordered out (never closed, so
  /// in-flight animations cannot touch a deallocated window). The caller
  /// has already stopped polling and invalidated callbacks.
  pub(crate) fn teardown(self) {
    self.surface.detach_sink();
    self.surface.order_out();
  }
}
