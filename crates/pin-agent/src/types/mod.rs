/*! Public types shared across the agent. */

mod error;
mod event;
mod geometry;
mod ids;
mod state;
mod target;

pub use error::{Permission, PinError, PinResult};
pub use event::StatusEvent;
pub use geometry::{Bounds, Point};
pub use ids::{ProcessId, WindowId};
pub use state::{AgentState, AgentStatus};
pub use target::TargetDescriptor;
