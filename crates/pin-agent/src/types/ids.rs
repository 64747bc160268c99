/*! Identifier newtypes for windows and processes. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque window identifier assigned by the window server.
#[derive(
  Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct WindowId(pub u32);

/// Process identifier of a window's owning application.
#[derive(
  Debug, Display, Clone, Copy, PartialEq, Eq, Hash, From, Into, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct ProcessId(pub u32);
