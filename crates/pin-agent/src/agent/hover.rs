/*!
Hover see-through policy and the mirror hidden/shown transitions.

Pointer-enter raises the real window, waits for the focus change to
settle, then hides the mirror so clicks go through. Pointer-exit (seen via
the global monitor, since a click-through mirror gets no events of its
own) restores it. Foreground changes away from the target also restore
it, but only after the mirror has been hidden for a settle interval, which
suppresses flicker during rapid focus churn.
*/

use parking_lot::MutexGuard;

use crate::platform::EventSink;
use crate::polling::run_after;
use crate::types::{AgentState, PinError, PinResult, Point, ProcessId, StatusEvent};

use super::{AgentInner, PinAgent, HOVER_HIDE_DELAY, RESHOW_SETTLE};

impl PinAgent {
  /// Enter see-through mode. Legal only while `Mirroring`.
  pub fn hide_mirror(&self) -> PinResult<()> {
    let mut inner = self.inner.lock();
    self.hide_mirror_locked(&mut inner)
  }

  /// Leave see-through mode. Legal only while `MirrorHidden`.
  pub fn show_mirror(&self) -> PinResult<()> {
    let mut inner = self.inner.lock();
    self.show_mirror_locked(&mut inner)
  }

  pub(crate) fn hide_mirror_locked(
    &self,
    inner: &mut MutexGuard<'_, AgentInner>,
  ) -> PinResult<()> {
    match inner.state {
      AgentState::Mirroring => {
        if let Some(overlay) = inner.overlay.as_mut() {
          overlay.set_hidden(true);
        }
        inner.mirror_hidden_at = Some(std::time::Instant::now());
        inner.state = AgentState::MirrorHidden;
        self.emit(StatusEvent::MirrorHidden);
        Ok(())
      }
      from => Err(PinError::InvalidStateTransition {
        from,
        to: AgentState::MirrorHidden,
      }),
    }
  }

  pub(crate) fn show_mirror_locked(
    &self,
    inner: &mut MutexGuard<'_, AgentInner>,
  ) -> PinResult<()> {
    match inner.state {
      AgentState::MirrorHidden => {
        if let Some(overlay) = inner.overlay.as_mut() {
          overlay.set_hidden(false);
        }
        inner.mirror_hidden_at = None;
        inner.state = AgentState::Mirroring;
        self.emit(StatusEvent::MirrorShown);
        Ok(())
      }
      from => Err(PinError::InvalidStateTransition {
        from,
        to: AgentState::Mirroring,
      }),
    }
  }

  fn finish_hover_enter(&self, epoch: u64, token: u64) {
    let mut inner = self.inner.lock();
    if inner.epoch != epoch || inner.pending_hover != Some(token) {
      return;
    }
    inner.pending_hover = None;
    if inner.state == AgentState::Mirroring {
      drop(self.hide_mirror_locked(&mut inner));
    }
  }

  fn recheck_reshow(&self, epoch: u64) {
    let mut inner = self.inner.lock();
    if inner.epoch != epoch || inner.state != AgentState::MirrorHidden {
      return;
    }
    let Some(target) = inner.target.as_ref() else {
      return;
    };
    if inner.frontmost_pid == Some(target.process_id) {
      return;
    }
    drop(self.show_mirror_locked(&mut inner));
  }
}

impl EventSink for PinAgent {
  fn pointer_moved(&self, at: Point) {
    let mut inner = self.inner.lock();
    let Some(mirror_rect) = inner.current_bounds else {
      return;
    };
    let over_mirror = mirror_rect.contains(at);

    match inner.state {
      AgentState::Mirroring => {
        if over_mirror && inner.pending_hover.is_none() {
          let Some(target) = inner.target.clone() else {
            return;
          };
          // Raise the real window now; hide the mirror only once the
          // focus change has settled underneath.
          inner.next_token += 1;
          let token = inner.next_token;
          inner.pending_hover = Some(token);
          let epoch = inner.epoch;
          self.platform.activate_app(target.process_id);
          let agent = self.clone();
          run_after(HOVER_HIDE_DELAY, move || {
            agent.finish_hover_enter(epoch, token);
          });
        } else if !over_mirror && inner.pending_hover.is_some() {
          // Left again before the delay fired: cancel the pending hide.
          inner.pending_hover = None;
        }
      }
      AgentState::MirrorHidden => {
        if !over_mirror {
          drop(self.show_mirror_locked(&mut inner));
        }
      }
      AgentState::Idle | AgentState::Error => {}
    }
  }

  fn frontmost_app_changed(&self, pid: ProcessId) {
    let mut inner = self.inner.lock();
    inner.frontmost_pid = Some(pid);

    if inner.state != AgentState::MirrorHidden {
      return;
    }
    let Some(target) = inner.target.as_ref() else {
      return;
    };
    if pid == target.process_id {
      // The target itself came forward: stay hidden.
      return;
    }

    let hidden_for = inner
      .mirror_hidden_at
      .map_or(RESHOW_SETTLE, |at| at.elapsed());
    if hidden_for < RESHOW_SETTLE {
      let epoch = inner.epoch;
      let agent = self.clone();
      run_after(RESHOW_SETTLE - hidden_for, move || {
        agent.recheck_reshow(epoch);
      });
    } else {
      drop(self.show_mirror_locked(&mut inner));
    }
  }

  fn unpin_clicked(&self) {
    self.unpin();
  }
}
