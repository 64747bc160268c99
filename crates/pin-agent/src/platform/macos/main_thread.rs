/*!
Main-thread marshalling via GCD.

`dispatch_get_main_queue()` is a C macro over `&_dispatch_main_q`, so we
link the underlying symbol directly.
*/

#![allow(unsafe_code)]

use std::ffi::c_void;

use objc2::MainThreadMarker;

/// Wrapper for values that are only ever touched on the main thread but
/// must ride inside `Send` closures or handles to get there.
pub(super) struct Mt<T>(pub(super) T);

// Safety: every access goes through `run_on_main`/`run_on_main_sync` or
// happens while the owner is already on the main thread.
unsafe impl<T> Send for Mt<T> {}
unsafe impl<T> Sync for Mt<T> {}

impl<T> std::ops::Deref for Mt<T> {
  type Target = T;
  fn deref(&self) -> &T {
    &self.0
  }
}

#[allow(non_camel_case_types)]
type dispatch_queue_t = *const c_void;
#[allow(non_camel_case_types)]
type dispatch_function_t = unsafe extern "C" fn(*mut c_void);

extern "C" {
  static _dispatch_main_q: c_void;

  fn dispatch_async_f(
    queue: dispatch_queue_t,
    context: *mut c_void,
    work: dispatch_function_t,
  );
}

/// Run a closure on the main thread, asynchronously.
pub(super) fn run_on_main<F: FnOnce(MainThreadMarker) + Send + 'static>(f: F) {
  if let Some(mtm) = MainThreadMarker::new() {
    f(mtm);
    return;
  }

  let boxed: Box<Box<dyn FnOnce() + Send>> = Box::new(Box::new(move || {
    let mtm = unsafe { MainThreadMarker::new_unchecked() };
    f(mtm);
  }));
  let raw = Box::into_raw(boxed).cast::<c_void>();
  unsafe {
    let main_queue: dispatch_queue_t = (&raw const _dispatch_main_q).cast();
    dispatch_async_f(main_queue, raw, trampoline);
  }

  unsafe extern "C" fn trampoline(ctx: *mut c_void) {
    let closure: Box<Box<dyn FnOnce() + Send>> = unsafe { Box::from_raw(ctx.cast()) };
    closure();
  }
}

/// Run a closure on the main thread and wait for its result.
pub(super) fn run_on_main_sync<T, F>(f: F) -> T
where
  T: Send + 'static,
  F: FnOnce(MainThreadMarker) -> T + Send + 'static,
{
  if let Some(mtm) = MainThreadMarker::new() {
    return f(mtm);
  }

  let (tx, rx) = std::sync::mpsc::sync_channel(1);
  run_on_main(move |mtm| {
    drop(tx.send(f(mtm)));
  });
  rx.recv().expect("main thread stopped servicing its queue")
}
