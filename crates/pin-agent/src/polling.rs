/*!
Background timing primitives.

A fixed-interval ticker drives geometry synchronization and liveness
checks while a pin is active, and one-shot delayed calls implement the
hover settle delays. Both are plain sleep threads; the agent guards
against late callbacks with its pin epoch.
*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Handle to a repeating background tick. Signals stop on drop.
///
/// Dropping does not join the worker thread; the final tick may still be
/// running while the handle is gone. Callers that need stronger ordering
/// drop the handle outside their own locks.
pub(crate) struct Ticker {
  stop: Arc<AtomicBool>,
  thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Ticker {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Ticker").finish_non_exhaustive()
  }
}

impl Drop for Ticker {
  fn drop(&mut self) {
    self.stop.store(true, Ordering::SeqCst);
    // Detach rather than join: the tick callback reaches back into the
    // agent, and joining from inside an agent operation would deadlock.
    drop(self.thread.take());
  }
}

/// Run `tick` every `interval` until the returned handle is dropped.
pub(crate) fn start_ticker<F>(interval: Duration, tick: F) -> Ticker
where
  F: Fn() + Send + 'static,
{
  let stop = Arc::new(AtomicBool::new(false));
  let stop_flag = Arc::clone(&stop);

  let thread = thread::spawn(move || {
    while !stop_flag.load(Ordering::SeqCst) {
      let started = Instant::now();
      tick();
      if stop_flag.load(Ordering::SeqCst) {
        break;
      }
      let elapsed = started.elapsed();
      if elapsed < interval {
        thread::sleep(interval - elapsed);
      }
    }
  });

  Ticker {
    stop,
    thread: Some(thread),
  }
}

/// Run `f` once after `delay` on a short-lived thread.
pub(crate) fn run_after<F>(delay: Duration, f: F)
where
  F: FnOnce() + Send + 'static,
{
  thread::spawn(move || {
    thread::sleep(delay);
    f();
  });
}
