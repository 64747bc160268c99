/*!
Pin lifecycle: entering and leaving the mirroring states.

A pin is transactional: on any failure after resource construction begins,
everything built so far is torn down and the agent is back in `Idle`.
Permission denial is the one hard failure that parks the agent in `Error`
until an explicit unpin.
*/

use std::sync::Arc;

use chrono::Utc;

use crate::capture::CaptureSession;
use crate::overlay::{display_for, OverlayController};
use crate::platform::EventSink;
use crate::polling::start_ticker;
use crate::types::{
  AgentState, PinError, PinResult, StatusEvent, TargetDescriptor, WindowId,
};

use super::{PinAgent, GEOMETRY_POLL_INTERVAL};

impl PinAgent {
  /// Pin the frontmost candidate window. An existing pin is released
  /// first; fails with `NoTargetWindow` when nothing is pinnable.
  pub fn pin_active(&self) -> PinResult<()> {
    if self.status().pinned {
      self.unpin();
    }
    let target = self
      .enumerator
      .find_frontmost()
      .ok_or(PinError::NoTargetWindow)?;
    self.pin(target)
  }

  /// Pin the candidate with the given window identifier.
  pub fn pin_window(&self, id: WindowId) -> PinResult<()> {
    let target = self
      .enumerator
      .find_candidate(id)
      .ok_or(PinError::NoTargetWindow)?;
    self.pin(target)
  }

  /// Pin a specific target. Re-pinning while already pinned performs an
  /// implicit unpin first, so the old overlay is fully torn down before
  /// the new one exists.
  pub fn pin(&self, target: TargetDescriptor) -> PinResult<()> {
    if self.status().pinned {
      self.unpin();
    }

    let mut inner = self.inner.lock();
    match inner.state {
      AgentState::Idle => {}
      from => {
        return Err(PinError::InvalidStateTransition {
          from,
          to: AgentState::Mirroring,
        })
      }
    }

    // Hard gate: without capture access nothing below can work. This
    // parks the agent in Error until the user fixes the permission and
    // unpins.
    if let Err(e) = self.gate.require_capture() {
      inner.state = AgentState::Error;
      return Err(e);
    }

    let shareable = match self.platform.shareable_window_ids() {
      Ok(ids) => ids,
      Err(e @ PinError::PermissionDenied(_)) => {
        inner.state = AgentState::Error;
        return Err(e);
      }
      Err(e) => return Err(e),
    };
    if !shareable.contains(&target.window_id) {
      return Err(PinError::CaptureFailure(
        "target window not in shareable content".into(),
      ));
    }

    let displays = self.platform.displays();
    let display = display_for(&target.bounds, &displays)
      .ok_or_else(|| PinError::CaptureFailure("no display intersects target".into()))?
      .clone();

    let events: Arc<dyn EventSink> = Arc::new(self.clone());
    let surface = self.platform.create_overlay(Arc::clone(&events))?;
    let overlay = OverlayController::present(surface, target.bounds, &displays, inner.opacity);

    let session = CaptureSession::new();
    if let Err(e) = session.start(&self.platform, &target, &display) {
      // Roll back: the pin either completes fully or leaves Idle intact.
      overlay.teardown();
      return Err(e);
    }
    overlay.attach_sink(&session.sink());

    inner
      .subscriptions
      .push(self.platform.watch_frontmost(Arc::clone(&events)));
    inner.subscriptions.push(self.platform.watch_pointer(events));

    let agent = self.clone();
    inner.ticker = Some(start_ticker(GEOMETRY_POLL_INTERVAL, move || {
      agent.on_tick();
    }));

    inner.epoch += 1;
    inner.session = Some(session);
    inner.overlay = Some(overlay);
    inner.current_bounds = Some(target.bounds);
    inner.target = Some(target.clone());
    inner.pinned_since = Some(Utc::now());
    inner.mirror_hidden_at = None;
    inner.pending_hover = None;
    inner.state = AgentState::Mirroring;
    drop(inner);

    log::info!(
      "pinned {} window {} ({})",
      target.app_name,
      target.window_id,
      target
        .window_title
        .as_deref()
        .unwrap_or("untitled")
    );
    self.emit(StatusEvent::Pinned { target });
    Ok(())
  }

  /// Release the current pin. Unconditional and idempotent; also the way
  /// out of the `Error` state.
  pub fn unpin(&self) {
    let (ticker, subscriptions, overlay, session, was_pinned) = {
      let mut inner = self.inner.lock();
      inner.epoch += 1;
      inner.pending_hover = None;
      let was_pinned = inner.state.is_pinned();

      // Teardown order is load-bearing: first silence the pollers and
      // monitors, then invalidate callbacks (the epoch bump above), then
      // stop capture, then dismantle the windows.
      let ticker = inner.ticker.take();
      let subscriptions = std::mem::take(&mut inner.subscriptions);
      let overlay = inner.overlay.take();
      let session = inner.session.take();

      inner.target = None;
      inner.current_bounds = None;
      inner.pinned_since = None;
      inner.mirror_hidden_at = None;
      inner.tick_count = 0;
      inner.state = AgentState::Idle;
      (ticker, subscriptions, overlay, session, was_pinned)
    };

    drop(ticker);
    drop(subscriptions);
    if let Some(session) = session {
      // Deferred: the session resets its flags and replaces its sink in
      // the stream's completion callback, after in-flight frames drain.
      session.stop(|| {});
    }
    if let Some(overlay) = overlay {
      overlay.teardown();
    }

    if was_pinned {
      log::info!("unpinned");
      self.emit(StatusEvent::Unpinned);
    }
  }

  /// Force-restore the system. Semantically `unpin()`, callable from any
  /// state including `Error`.
  pub fn panic(&self) {
    self.unpin();
  }
}
