/*!
ScreenCaptureKit stream over a single-window content filter.

Frames arrive on ScreenCaptureKit's delivery queue; each one is validated,
counted into the session's sink, and its backing surface forwarded to the
overlay layer on the main thread. Stop is requested from a detached
thread so the completion callback never runs inside an agent operation.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::ffi::c_void;
use std::thread;

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use parking_lot::Mutex;
use screencapturekit::cm_time::CMTime;
use screencapturekit::output::CMSampleBuffer;
use screencapturekit::shareable_content::SCShareableContent;
use screencapturekit::stream::configuration::{PixelFormat, SCStreamConfiguration};
use screencapturekit::stream::content_filter::SCContentFilter;
use screencapturekit::stream::output_trait::SCStreamOutputTrait;
use screencapturekit::stream::output_type::SCStreamOutputType;
use screencapturekit::stream::SCStream;

use crate::capture::{CaptureConfig, DisplaySink, FrameInfo};
use crate::types::{PinError, PinResult, TargetDescriptor, WindowId};

use super::super::traits::CaptureStream;
use super::main_thread::Mt;
use super::overlay;
use super::permissions;

#[link(name = "CoreVideo", kind = "framework")]
extern "C" {
  fn CVPixelBufferGetIOSurface(pixel_buffer: *const c_void) -> *mut AnyObject;
}

/// Window identifiers currently eligible for capture.
pub(super) fn shareable_window_ids() -> PinResult<Vec<WindowId>> {
  let content = shareable_content()?;
  Ok(
    content
      .windows()
      .iter()
      .map(|w| WindowId(w.window_id()))
      .collect(),
  )
}

fn shareable_content() -> PinResult<SCShareableContent> {
  SCShareableContent::get().map_err(|e| {
    if permissions::preflight_capture_access() {
      PinError::CaptureFailure(format!("shareable content query failed: {e}"))
    } else {
      PinError::PermissionDenied(crate::types::Permission::Capture)
    }
  })
}

struct FrameHandler {
  sink: DisplaySink,
}

impl SCStreamOutputTrait for FrameHandler {
  fn did_output_sample_buffer(&self, sample_buffer: CMSampleBuffer, of_type: SCStreamOutputType) {
    if of_type != SCStreamOutputType::Screen {
      return;
    }
    let Ok(pixel_buffer) = sample_buffer.get_pixel_buffer() else {
      return;
    };

    let frame = FrameInfo {
      width: pixel_buffer.get_width(),
      height: pixel_buffer.get_height(),
    };
    if frame.width == 0 || frame.height == 0 {
      return;
    }
    self.sink.submit(frame);

    let surface = unsafe { CVPixelBufferGetIOSurface(pixel_buffer.as_ptr().cast()) };
    let Some(surface) = std::ptr::NonNull::new(surface) else {
      return;
    };
    // Retain the surface so it outlives this sample buffer on the way to
    // the main thread.
    let contents = unsafe { Retained::retain(surface.as_ptr()) };
    if let Some(contents) = contents {
      overlay::render_frame(Mt(contents));
    }
  }
}

fn stream_configuration(config: &CaptureConfig) -> SCStreamConfiguration {
  let fps = (1.0 / config.min_frame_interval).round().max(1.0) as i32;
  SCStreamConfiguration::new()
    .with_width(config.width)
    .with_height(config.height)
    .with_pixel_format(PixelFormat::BGRA)
    .with_shows_cursor(false)
    .with_captures_audio(false)
    .with_minimum_frame_interval(CMTime::new(1, fps))
}

struct MacCaptureStream {
  stream: Mutex<SCStream>,
}

impl CaptureStream for MacCaptureStream {
  fn update_config(&self, config: &CaptureConfig) -> PinResult<()> {
    self
      .stream
      .lock()
      .update_configuration(&stream_configuration(config))
      .map_err(|e| PinError::CaptureFailure(format!("stream reconfigure failed: {e}")))
  }

  fn stop(self: Box<Self>, on_stopped: Box<dyn FnOnce() + Send>) {
    thread::spawn(move || {
      let stream = self.stream.into_inner();
      if let Err(e) = stream.stop_capture() {
        log::warn!("stream stop reported: {e}");
      }
      drop(stream);
      on_stopped();
    });
  }
}

/// Open a live stream restricted to the target window.
pub(super) fn open_stream(
  target: &TargetDescriptor,
  config: &CaptureConfig,
  sink: DisplaySink,
) -> PinResult<Box<dyn CaptureStream>> {
  let content = shareable_content()?;
  let window = content
    .windows()
    .into_iter()
    .find(|w| WindowId(w.window_id()) == target.window_id)
    .ok_or_else(|| PinError::CaptureFailure("target window not in shareable content".into()))?;

  let filter = SCContentFilter::new().with_desktop_independent_window(&window);
  let configuration = stream_configuration(config);

  let mut stream = SCStream::new(&filter, &configuration);
  stream.add_output_handler(FrameHandler { sink }, SCStreamOutputType::Screen);
  stream
    .start_capture()
    .map_err(|e| PinError::CaptureFailure(format!("stream start refused: {e}")))?;

  Ok(Box::new(MacCaptureStream {
    stream: Mutex::new(stream),
  }))
}
