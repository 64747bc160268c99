// Menu bar status item and `pin://` URL handling.
//
// The status item offers Pin Frontmost, a window picker (one entry per
// application), Unpin, and Quit. Every action goes through the command
// dispatcher, same as external URL activations, so the response file
// stays the single source of truth for front-end observers.

#![allow(unsafe_code)]

use std::sync::{Mutex, OnceLock};

use objc2::rc::Retained;
use objc2::runtime::NSObject;
use objc2::{define_class, msg_send, sel, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{
  NSApplication, NSApplicationActivationPolicy, NSMenu, NSMenuItem, NSStatusBar, NSStatusItem,
  NSVariableStatusItemLength,
};
use objc2_foundation::{
  NSAppleEventDescriptor, NSAppleEventManager, NSObjectProtocol, NSString,
};

use pin_agent::{platform, Command, CommandDispatcher, PinAgent, WindowId};

// 'GURL' and '----' four-char codes.
const K_INTERNET_EVENT_CLASS: u32 = 0x4755_524C;
const K_AE_GET_URL: u32 = 0x4755_524C;
const KEY_DIRECT_OBJECT: u32 = 0x2D2D_2D2D;

// Safety: all menu state is accessed exclusively on the main thread.
struct Mt<T>(T);
unsafe impl<T> Send for Mt<T> {}

static DISPATCHER: OnceLock<CommandDispatcher> = OnceLock::new();
static STATUS_ITEM: Mutex<Option<Mt<Retained<NSStatusItem>>>> = Mutex::new(None);
static MENU_TARGET: Mutex<Option<Mt<Retained<MenuTarget>>>> = Mutex::new(None);

fn dispatcher() -> &'static CommandDispatcher {
  DISPATCHER.get().expect("dispatcher initialized in run()")
}

define_class!(
  #[unsafe(super(NSObject))]
  #[name = "PinMenuTarget"]
  #[thread_kind = MainThreadOnly]
  struct MenuTarget;

  unsafe impl NSObjectProtocol for MenuTarget {}

  impl MenuTarget {
    #[unsafe(method(pinFrontmost:))]
    fn pin_frontmost(&self, _sender: *mut NSObject) {
      dispatcher().dispatch(&Command::Pin);
      refresh(self);
    }

    #[unsafe(method(pinWindow:))]
    fn pin_window(&self, sender: *mut NSObject) {
      let tag: isize = unsafe { msg_send![sender, tag] };
      if let Ok(id) = u32::try_from(tag) {
        dispatcher().dispatch(&Command::PinWindow {
          id: WindowId(id),
        });
      }
      refresh(self);
    }

    #[unsafe(method(unpin:))]
    fn unpin(&self, _sender: *mut NSObject) {
      dispatcher().dispatch(&Command::Unpin);
      refresh(self);
    }

    #[unsafe(method(refreshWindows:))]
    fn refresh_windows(&self, _sender: *mut NSObject) {
      refresh(self);
    }

    #[unsafe(method(quit:))]
    fn quit(&self, _sender: *mut NSObject) {
      dispatcher().dispatch(&Command::Unpin);
      if let Some(mtm) = MainThreadMarker::new() {
        NSApplication::sharedApplication(mtm).terminate(None);
      }
    }

    #[unsafe(method(handleGetURLEvent:withReplyEvent:))]
    fn handle_get_url_event(
      &self,
      event: *mut NSAppleEventDescriptor,
      _reply: *mut NSAppleEventDescriptor,
    ) {
      if event.is_null() {
        return;
      }
      let url = unsafe {
        (*event)
          .paramDescriptorForKeyword(KEY_DIRECT_OBJECT)
          .and_then(|d| d.stringValue())
      };
      if let Some(url) = url {
        dispatcher().handle_url(&url.to_string());
        refresh(self);
      }
    }
  }
);

fn refresh(_target: &MenuTarget) {
  if let Some(mtm) = MainThreadMarker::new() {
    rebuild_menu(mtm);
  }
}

impl MenuTarget {
  fn new(mtm: MainThreadMarker) -> Retained<Self> {
    let alloc = Self::alloc(mtm);
    unsafe { msg_send![alloc, init] }
  }
}

fn menu_item(
  mtm: MainThreadMarker,
  title: &str,
  action: Option<objc2::runtime::Sel>,
  target: Option<&MenuTarget>,
) -> Retained<NSMenuItem> {
  let item = unsafe {
    NSMenuItem::initWithTitle_action_keyEquivalent(
      mtm.alloc(),
      &NSString::from_str(title),
      action,
      &NSString::from_str(""),
    )
  };
  if let Some(target) = target {
    unsafe { item.setTarget(Some(target)) };
  }
  item
}

fn rebuild_menu(mtm: MainThreadMarker) {
  let status_item = match STATUS_ITEM.lock().ok().and_then(|g| {
    g.as_ref().map(|item| item.0.clone())
  }) {
    Some(item) => item,
    None => return,
  };
  let target = match MENU_TARGET.lock().ok().and_then(|g| {
    g.as_ref().map(|target| target.0.clone())
  }) {
    Some(target) => target,
    None => return,
  };
  let agent = dispatcher().agent();

  let menu = NSMenu::new(mtm);

  let status = agent.status();
  let headline = match status.target_app_name {
    Some(name) if status.pinned => format!("Pinned: {name}"),
    _ => "Not pinned".to_owned(),
  };
  let status_line = menu_item(mtm, &headline, None, None);
  unsafe { status_line.setEnabled(false) };
  menu.addItem(&status_line);
  menu.addItem(&NSMenuItem::separatorItem(mtm));

  menu.addItem(&menu_item(
    mtm,
    "Pin Frontmost Window",
    Some(sel!(pinFrontmost:)),
    Some(&target),
  ));

  // One entry per application, friendlier labels.
  let picker = NSMenu::new(mtm);
  for entry in agent.enumerator().list_by_app() {
    let item = menu_item(mtm, &entry.label, Some(sel!(pinWindow:)), Some(&target));
    unsafe { item.setTag(entry.target.window_id.0 as isize) };
    picker.addItem(&item);
  }
  let picker_root = menu_item(mtm, "Pin Window", None, None);
  menu.setSubmenu_forItem(Some(&picker), &picker_root);
  menu.addItem(&picker_root);

  menu.addItem(&menu_item(
    mtm,
    "Refresh Window List",
    Some(sel!(refreshWindows:)),
    Some(&target),
  ));
  menu.addItem(&menu_item(mtm, "Unpin", Some(sel!(unpin:)), Some(&target)));
  menu.addItem(&NSMenuItem::separatorItem(mtm));
  menu.addItem(&menu_item(mtm, "Quit Pin", Some(sel!(quit:)), Some(&target)));

  status_item.setMenu(Some(&menu));
}

pub(crate) fn run() {
  let mtm = MainThreadMarker::new().expect("pin must start on the main thread");
  let app = NSApplication::sharedApplication(mtm);
  app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

  let agent = PinAgent::new(platform::default_platform());
  let probe = agent.permissions().probe();
  if !probe.capture_granted {
    log::warn!("screen capture permission not granted yet; pin commands will fail");
  }
  DISPATCHER.set(CommandDispatcher::new(agent)).ok();

  let target = MenuTarget::new(mtm);

  // pin:// activations arrive as Apple events.
  unsafe {
    NSAppleEventManager::sharedAppleEventManager()
      .setEventHandler_andSelector_forEventClass_andEventID(
        &target,
        sel!(handleGetURLEvent:withReplyEvent:),
        K_INTERNET_EVENT_CLASS,
        K_AE_GET_URL,
      );
  }

  let status_bar = NSStatusBar::systemStatusBar();
  let status_item = status_bar.statusItemWithLength(unsafe { NSVariableStatusItemLength });
  if let Some(button) = status_item.button(mtm) {
    button.setTitle(&NSString::from_str("\u{1F4CC}"));
  }

  if let Ok(mut slot) = STATUS_ITEM.lock() {
    *slot = Some(Mt(status_item));
  }
  if let Ok(mut slot) = MENU_TARGET.lock() {
    *slot = Some(Mt(target));
  }
  rebuild_menu(mtm);

  log::info!("pin menu bar ready");
  app.run();
}
