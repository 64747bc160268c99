/*!
Command dispatcher: the external command channel.

Commands arrive as `pin://<command>?<k=v>` URL activations. Each command
is executed against the agent and its result written as pretty-printed
JSON to a well-known response file, atomically (temp file + rename in the
same directory), which the launcher front-end polls.
*/

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value as JsonValue};
use url::Url;

use crate::agent::PinAgent;
use crate::types::{PinResult, WindowId};

/// Where command responses are written.
pub const RESPONSE_PATH: &str = "/tmp/pin-response.json";

/// A parsed external command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  Pin,
  PinWindow { id: WindowId },
  ListWindows,
  Unpin,
  Panic,
  Status,
  SetOpacity { value: f64 },
  /// Anything unrecognized, kept verbatim for the error response.
  Unknown(String),
}

impl Command {
  /// Parse a `pin://` activation URL. Anything that is not a well-formed
  /// known command becomes [`Command::Unknown`].
  pub fn parse(input: &str) -> Command {
    let Ok(url) = Url::parse(input) else {
      return Command::Unknown(input.to_owned());
    };
    if url.scheme() != "pin" {
      return Command::Unknown(input.to_owned());
    }
    let name = url.host_str().unwrap_or_default();
    let args: HashMap<String, String> = url.query_pairs().into_owned().collect();

    match name {
      "pin" => Command::Pin,
      "pin-window" => match args.get("id").and_then(|v| v.parse::<u32>().ok()) {
        Some(id) => Command::PinWindow {
          id: WindowId(id),
        },
        None => Command::Unknown(input.to_owned()),
      },
      "list-windows" => Command::ListWindows,
      "unpin" => Command::Unpin,
      "panic" => Command::Panic,
      "status" => Command::Status,
      "set-opacity" => match args.get("value").and_then(|v| v.parse::<f64>().ok()) {
        Some(value) => Command::SetOpacity { value },
        None => Command::Unknown(input.to_owned()),
      },
      other => Command::Unknown(other.to_owned()),
    }
  }
}

/// Executes commands against the agent and writes the response file.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
  agent: PinAgent,
  response_path: PathBuf,
}

impl CommandDispatcher {
  pub fn new(agent: PinAgent) -> Self {
    Self::with_response_path(agent, PathBuf::from(RESPONSE_PATH))
  }

  pub fn with_response_path(agent: PinAgent, response_path: PathBuf) -> Self {
    Self {
      agent,
      response_path,
    }
  }

  /// The agent this dispatcher drives.
  pub fn agent(&self) -> &PinAgent {
    &self.agent
  }

  /// Handle one activation URL end-to-end: parse, execute, persist the
  /// response. The response is also returned for in-process callers.
  pub fn handle_url(&self, input: &str) -> JsonValue {
    let command = Command::parse(input);
    self.dispatch(&command)
  }

  /// Execute a parsed command and write its response.
  pub fn dispatch(&self, command: &Command) -> JsonValue {
    let response = self.execute(command);
    self.write_response(&response);
    response
  }

  fn execute(&self, command: &Command) -> JsonValue {
    match command {
      Command::Pin => outcome(self.agent.pin_active(), "pinned"),
      Command::PinWindow { id } => outcome(self.agent.pin_window(*id), "pinned"),
      Command::ListWindows => {
        let windows = self.agent.enumerator().list_candidates();
        json!({ "success": true, "windows": windows })
      }
      Command::Unpin => {
        self.agent.unpin();
        json!({ "success": true, "message": "unpinned" })
      }
      Command::Panic => {
        self.agent.panic();
        json!({ "success": true, "message": "panic_complete" })
      }
      Command::Status => serde_json::to_value(self.agent.status())
        .unwrap_or_else(|e| json!({ "error": e.to_string() })),
      Command::SetOpacity { value } => {
        let applied = self.agent.set_opacity(*value);
        json!({ "success": true, "message": "opacity_set", "opacity": applied })
      }
      Command::Unknown(cmd) => {
        log::warn!("unknown command: {cmd}");
        json!({ "error": format!("unknown_command: {cmd}") })
      }
    }
  }

  fn write_response(&self, response: &JsonValue) {
    let pretty = match serde_json::to_string_pretty(response) {
      Ok(s) => s,
      Err(e) => {
        log::error!("could not serialize response: {e}");
        return;
      }
    };
    if let Err(e) = write_atomic(&self.response_path, &pretty) {
      log::error!(
        "could not write response file {}: {e}",
        self.response_path.display()
      );
    }
  }
}

/// Write via a sibling temp file and rename, so readers never observe a
/// partially written response.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);
  std::fs::write(&tmp, contents)?;
  std::fs::rename(&tmp, path)
}

fn outcome(result: PinResult<()>, message: &str) -> JsonValue {
  match result {
    Ok(()) => json!({ "success": true, "message": message }),
    Err(e) => json!({ "success": false, "error": e.to_string() }),
  }
}
