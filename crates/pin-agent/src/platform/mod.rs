/*! Platform layer: capability traits plus the macOS implementation. */

mod traits;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(test)]
pub(crate) mod mock;

pub use traits::{
  CaptureStream, DisplayInfo, EventSink, OverlaySurface, Platform, RawWindow, Subscription,
};

/// The production platform for the current OS.
#[cfg(target_os = "macos")]
pub fn default_platform() -> std::sync::Arc<dyn Platform> {
  std::sync::Arc::new(macos::MacPlatform::new())
}
