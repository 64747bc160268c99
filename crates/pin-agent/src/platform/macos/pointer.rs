/*! Global pointer monitoring.

A click-through mirror window receives no events of its own, so hover
exit has to be observed globally. Locations arrive bottom-left-origin and
are flipped against the primary screen before they reach the agent.
*/

#![allow(unsafe_code)]

use std::ptr::NonNull;
use std::sync::Arc;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::MainThreadMarker;
use objc2_app_kit::{NSEvent, NSEventMask, NSScreen};

use crate::types::Point;

use super::super::traits::{EventSink, Subscription};
use super::main_thread::{run_on_main, run_on_main_sync, Mt};

struct PointerSubscription {
  monitor: Option<Mt<Retained<AnyObject>>>,
}

impl Subscription for PointerSubscription {}

impl Drop for PointerSubscription {
  fn drop(&mut self) {
    if let Some(monitor) = self.monitor.take() {
      run_on_main(move |_mtm| {
        unsafe { NSEvent::removeMonitor(&monitor.0) };
      });
    }
  }
}

fn flipped_pointer_location(mtm: MainThreadMarker) -> Option<Point> {
  let location = unsafe { NSEvent::mouseLocation() };
  let screens = NSScreen::screens(mtm);
  if screens.count() == 0 {
    return None;
  }
  let primary_height = screens.objectAtIndex(0).frame().size.height;
  Some(Point::new(location.x, primary_height - location.y))
}

/// Observe pointer movement and drags anywhere on screen.
pub(super) fn watch_pointer(events: Arc<dyn EventSink>) -> Box<dyn Subscription> {
  let monitor = run_on_main_sync(move |_mtm| {
    let block = RcBlock::new(move |_event: NonNull<NSEvent>| {
      // The handler runs on the main thread.
      let Some(mtm) = MainThreadMarker::new() else {
        return;
      };
      if let Some(point) = flipped_pointer_location(mtm) {
        events.pointer_moved(point);
      }
    });

    let mask = NSEventMask::MouseMoved | NSEventMask::LeftMouseDragged;
    unsafe { NSEvent::addGlobalMonitorForEventsMatchingMask_handler(mask, &block) }.map(Mt)
  });

  if monitor.is_none() {
    log::warn!("global pointer monitor could not be installed");
  }
  Box::new(PointerSubscription { monitor })
}
