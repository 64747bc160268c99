/*! Geometry types for screen coordinates.

Window bounds arrive from the window server in top-left-origin global
coordinates; AppKit windows are placed in bottom-left-origin coordinates.
The conversion lives here so it can be tested without a window server.
*/

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Rectangle bounds in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  #[serde(rename = "width")]
  pub w: f64,
  #[serde(rename = "height")]
  pub h: f64,
}

impl Bounds {
  pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
    Self { x, y, w, h }
  }

  /// Check if a point is contained within these bounds.
  pub fn contains(&self, point: Point) -> bool {
    point.x >= self.x
      && point.x <= self.x + self.w
      && point.y >= self.y
      && point.y <= self.y + self.h
  }

  /// Check if two bounds match within a margin of error.
  pub fn matches(&self, other: &Bounds, margin: f64) -> bool {
    (self.x - other.x).abs() <= margin
      && (self.y - other.y).abs() <= margin
      && (self.w - other.w).abs() <= margin
      && (self.h - other.h).abs() <= margin
  }

  /// Area of the intersection with another rectangle. Zero when disjoint.
  pub fn intersection_area(&self, other: &Bounds) -> f64 {
    let ix = (self.x + self.w).min(other.x + other.w) - self.x.max(other.x);
    let iy = (self.y + self.h).min(other.y + other.h) - self.y.max(other.y);
    if ix > 0.0 && iy > 0.0 {
      ix * iy
    } else {
      0.0
    }
  }

  /// Convert from top-left-origin to bottom-left-origin coordinates,
  /// flipping within the given screen.
  ///
  /// `screen_top_left` is the screen's frame in top-left-origin global
  /// coordinates, `screen_bottom_left` the same screen's frame as the
  /// windowing system reports it bottom-left-origin. Using the screen that
  /// actually contains the rectangle (rather than the primary screen)
  /// keeps the result correct across displays of differing scale.
  pub fn to_bottom_left(&self, screen_top_left: &Bounds, screen_bottom_left: &Bounds) -> Bounds {
    let from_top = self.y - screen_top_left.y;
    Bounds {
      x: screen_bottom_left.x + (self.x - screen_top_left.x),
      y: screen_bottom_left.y + screen_top_left.h - from_top - self.h,
      w: self.w,
      h: self.h,
    }
  }
}

/// A 2D point in screen coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}
