/*!
The pin agent: the state machine coordinating enumeration, capture,
overlay, hover policy, and liveness.

# Module structure

- `mod.rs` - `PinAgent` struct, construction, event broadcasting, the
  shared poll tick
- `pinning.rs` - `pin_active()`, `pin()`, `unpin()`, `panic()`
- `hover.rs` - pointer/foreground handlers, `hide_mirror()`/`show_mirror()`,
  the re-show settle policy
- `status.rs` - `status()` projection and `set_opacity()`

# Example

```ignore
use pin_agent::{platform, PinAgent};

let agent = PinAgent::new(platform::default_platform());
agent.pin_active()?;

let mut events = agent.subscribe();
while let Ok(event) = events.recv().await {
    // handle event
}

agent.unpin();
```
*/

mod hover;
mod pinning;
mod status;


use std::sync::Arc;
use std::time::{Duration, Instant};

use async_broadcast::{InactiveReceiver, Sender};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};

use crate::capture::CaptureSession;
use crate::enumerator::WindowEnumerator;
use crate::overlay::{display_for, OverlayController};
use crate::permissions::PermissionGate;
use crate::platform::{Platform, Subscription};
use crate::polling::Ticker;
use crate::prefs::PrefStore;
use crate::types::{
  AgentState, Bounds, ProcessId, StatusEvent, TargetDescriptor,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Interval of the shared poll driving geometry sync.
pub(crate) const GEOMETRY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Liveness runs every this many geometry ticks (1 Hz).
const LIVENESS_TICK_DIVISOR: u64 = 10;

/// Delay between activating the target app and hiding the mirror, so the
/// focus change completes underneath first.
pub(crate) const HOVER_HIDE_DELAY: Duration = Duration::from_millis(250);

/// Minimum time the mirror stays hidden before a foreground change may
/// re-show it.
pub(crate) const RESHOW_SETTLE: Duration = Duration::from_millis(500);

pub(crate) struct AgentInner {
  pub(crate) state: AgentState,
  pub(crate) target: Option<TargetDescriptor>,
  /// Latest observed target bounds; the mirror rect.
  pub(crate) current_bounds: Option<Bounds>,
  pub(crate) pinned_since: Option<DateTime<Utc>>,
  pub(crate) mirror_hidden_at: Option<Instant>,
  /// Bumped on every pin and unpin; delayed callbacks from an earlier
  /// epoch are no-ops.
  pub(crate) epoch: u64,
  /// Token of the scheduled hover hide, if one is pending.
  pub(crate) pending_hover: Option<u64>,
  pub(crate) next_token: u64,
  pub(crate) frontmost_pid: Option<ProcessId>,
  pub(crate) session: Option<CaptureSession>,
  pub(crate) overlay: Option<OverlayController>,
  pub(crate) ticker: Option<Ticker>,
  pub(crate) subscriptions: Vec<Box<dyn Subscription>>,
  pub(crate) tick_count: u64,
  pub(crate) opacity: f64,
}

/// The agent instance. Clone is cheap (Arc bumps); all clones share state.
///
/// Every operation serializes on one internal lock, which gives commands,
/// timer callbacks, and platform events the ordering of a single UI
/// thread.
pub struct PinAgent {
  pub(crate) inner: Arc<Mutex<AgentInner>>,
  pub(crate) platform: Arc<dyn Platform>,
  pub(crate) enumerator: WindowEnumerator,
  pub(crate) gate: PermissionGate,
  pub(crate) prefs: PrefStore,
  events_tx: Sender<StatusEvent>,
  events_keepalive: InactiveReceiver<StatusEvent>,
}

impl Clone for PinAgent {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
      platform: Arc::clone(&self.platform),
      enumerator: self.enumerator.clone(),
      gate: self.gate.clone(),
      prefs: self.prefs.clone(),
      events_tx: self.events_tx.clone(),
      events_keepalive: self.events_keepalive.clone(),
    }
  }
}

impl std::fmt::Debug for PinAgent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PinAgent").finish_non_exhaustive()
  }
}

/// Builder for configuring a [`PinAgent`].
#[must_use = "Builder does nothing until .build() is called"]
pub struct PinAgentBuilder {
  platform: Arc<dyn Platform>,
  prefs: Option<PrefStore>,
}

impl std::fmt::Debug for PinAgentBuilder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PinAgentBuilder").finish_non_exhaustive()
  }
}

impl PinAgentBuilder {
  /// Use a specific preference store (tests point this at a scratch file).
  pub fn prefs(mut self, store: PrefStore) -> Self {
    self.prefs = Some(store);
    self
  }

  pub fn build(self) -> PinAgent {
    let prefs = self.prefs.unwrap_or_default();
    let opacity = prefs.mirror_opacity();

    let (mut tx, rx) = async_broadcast::broadcast(EVENT_CHANNEL_CAPACITY);
    tx.set_overflow(true); // Drop oldest events when full

    PinAgent {
      inner: Arc::new(Mutex::new(AgentInner {
        state: AgentState::Idle,
        target: None,
        current_bounds: None,
        pinned_since: None,
        mirror_hidden_at: None,
        epoch: 0,
        pending_hover: None,
        next_token: 0,
        frontmost_pid: None,
        session: None,
        overlay: None,
        ticker: None,
        subscriptions: Vec::new(),
        tick_count: 0,
        opacity,
      })),
      enumerator: WindowEnumerator::new(Arc::clone(&self.platform)),
      gate: PermissionGate::new(Arc::clone(&self.platform)),
      platform: self.platform,
      prefs,
      events_tx: tx,
      events_keepalive: rx.deactivate(),
    }
  }
}

impl PinAgent {
  /// Create an agent with default preferences.
  pub fn new(platform: Arc<dyn Platform>) -> Self {
    Self::builder(platform).build()
  }

  pub fn builder(platform: Arc<dyn Platform>) -> PinAgentBuilder {
    PinAgentBuilder {
      platform,
      prefs: None,
    }
  }

  /// Subscribe to lifecycle events.
  pub fn subscribe(&self) -> async_broadcast::Receiver<StatusEvent> {
    self.events_keepalive.activate_cloned()
  }

  /// The enumerator this agent selects targets with.
  pub fn enumerator(&self) -> &WindowEnumerator {
    &self.enumerator
  }

  /// The permission gate for this agent's platform.
  pub fn permissions(&self) -> &PermissionGate {
    &self.gate
  }

  pub(crate) fn emit(&self, event: StatusEvent) {
    // Overflow is enabled, so this never blocks; a lagging subscriber
    // loses the oldest events.
    drop(self.events_tx.try_broadcast(event));
  }

  /// One geometry/liveness tick. Skips when an operation holds the lock;
  /// the next tick catches up.
  pub(crate) fn on_tick(&self) {
    let Some(mut inner) = self.inner.try_lock() else {
      return;
    };
    if !inner.state.is_pinned() {
      return;
    }
    inner.tick_count += 1;

    let Some(target) = inner.target.clone() else {
      return;
    };

    if inner.tick_count % LIVENESS_TICK_DIVISOR == 0
      && !self.enumerator.exists(target.window_id)
    {
      log::info!(
        "target window {} ({}) disappeared; unpinning",
        target.window_id,
        target.app_name
      );
      drop(inner);
      self.unpin();
      return;
    }

    self.sync_target_geometry(&mut inner, &target);
  }

  fn sync_target_geometry(&self, inner: &mut MutexGuard<'_, AgentInner>, target: &TargetDescriptor) {
    let Some(bounds) = self.enumerator.bounds(target.window_id) else {
      // Not reported this tick; liveness decides whether it is gone.
      return;
    };
    if inner.current_bounds == Some(bounds) {
      return;
    }
    let displays = self.platform.displays();
    if let Some(overlay) = inner.overlay.as_mut() {
      overlay.sync_geometry(bounds, &displays);
    }
    if let Some(session) = inner.session.as_ref() {
      if let Some(display) = display_for(&bounds, &displays) {
        session.resize(&bounds, display);
      }
    }
    inner.current_bounds = Some(bounds);
  }
}
