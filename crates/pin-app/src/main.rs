// Pin — keep any window on top by mirroring it in a floating overlay.
//
// This binary is the thin front of house: a menu-bar status item and the
// `pin://` URL entry point, both forwarding to the agent's command
// dispatcher. Everything interesting lives in the pin-agent crate.

#[cfg(target_os = "macos")]
mod menubar;

fn main() {
  env_logger::init();

  #[cfg(target_os = "macos")]
  menubar::run();

  #[cfg(not(target_os = "macos"))]
  {
    log::error!("Pin mirrors macOS windows and only runs on macOS");
    eprintln!("pin: this platform is not supported");
    std::process::exit(1);
  }
}
