/*!
Pin Agent - keep any window visually on top by mirroring it.

The agent continuously captures a chosen target window and re-displays its
frames inside a borderless floating overlay ordered above everything else.
Moving the pointer over the mirror activates the real window and lets
clicks pass through; moving away restores the mirror. A small unpin
button stays clickable the whole time.

```ignore
use pin_agent::{CommandDispatcher, PinAgent};

let agent = PinAgent::new(pin_agent::platform::default_platform());
let dispatcher = CommandDispatcher::new(agent.clone());

// Commands arrive as URL activations from the launcher front-end.
dispatcher.handle_url("pin://pin");
dispatcher.handle_url("pin://status");
dispatcher.handle_url("pin://unpin");
```

State is coordinated by a four-state machine (`Idle`, `Mirroring`,
`MirrorHidden`, `Error`); a 100 ms geometry poll keeps the overlay glued
to the target and a 1 Hz liveness poll unpins when the target closes.
*/

mod agent;
mod capture;
mod dispatch;
mod enumerator;
mod overlay;
mod permissions;
mod polling;
mod prefs;

pub mod platform;

mod types;
pub use types::*;

pub use crate::agent::{PinAgent, PinAgentBuilder};
pub use crate::capture::{CaptureConfig, CaptureSession, DisplaySink, FrameInfo};
pub use crate::dispatch::{Command, CommandDispatcher, RESPONSE_PATH};
pub use crate::enumerator::{PickerItem, WindowEnumerator};
pub use crate::permissions::{PermissionGate, PermissionProbe};
pub use crate::prefs::PrefStore;
