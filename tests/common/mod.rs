//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use keymode::host::{FocusTarget, Host};
use keymode::keymap::{parse_key_string, parse_keymap_yaml, KeyCode, KeyEvent};
use keymode::{ActionOutcome, Scope, Shortcuts};

/// Host that records everything the engine asks of it
#[derive(Debug)]
pub struct RecordingHost {
    /// Each call to `send_key_sequence`, rendered as key strings
    pub sent: Vec<Vec<String>>,
    pub errors: Vec<(String, String)>,
    pub beeps: usize,
    /// Every `set_ignore_os_keyboard_processing` call, in order
    pub ignore_os: Vec<bool>,
    pub focus: Option<FocusTarget>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            errors: Vec::new(),
            beeps: 0,
            ignore_os: Vec::new(),
            focus: Some(FocusTarget::new(1, 1)),
        }
    }
}

impl RecordingHost {
    pub fn without_window() -> Self {
        Self {
            focus: None,
            ..Self::default()
        }
    }
}

impl Host for RecordingHost {
    fn send_key_sequence(&mut self, keys: &[KeyEvent]) {
        self.sent.push(keys.iter().map(ToString::to_string).collect());
    }

    fn show_error(&mut self, title: &str, message: &str) {
        self.errors.push((title.to_string(), message.to_string()));
    }

    fn active_focus(&self) -> Option<FocusTarget> {
        self.focus
    }

    fn beep(&mut self) {
        self.beeps += 1;
    }

    fn set_ignore_os_keyboard_processing(&mut self, on: bool) {
        self.ignore_os.push(on);
    }
}

/// Actions that ran, as "name args..."
pub type HandlerLog = Rc<RefCell<Vec<String>>>;

pub fn handler_log() -> HandlerLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Build an engine from keymap YAML
pub fn engine(yaml: &str) -> Shortcuts {
    let config = parse_keymap_yaml(yaml).expect("test keymap should parse");
    Shortcuts::from_config(&config)
}

/// Register handlers for `names` in `scope` that log and consume
pub fn record(shortcuts: &mut Shortcuts, scope: Scope, names: &[&str], log: &HandlerLog) {
    record_with(shortcuts, scope, names, log, ActionOutcome::Consumed);
}

/// Register handlers for `names` in `scope` that log and return `outcome`
pub fn record_with(
    shortcuts: &mut Shortcuts,
    scope: Scope,
    names: &[&str],
    log: &HandlerLog,
    outcome: ActionOutcome,
) {
    for name in names {
        let log = Rc::clone(log);
        shortcuts.register(scope, *name, move |cx| {
            log.borrow_mut().push(cx.action.to_string());
            Ok(outcome)
        });
    }
}

/// Key event for a key string like "ctrl+x"
pub fn key(s: &str) -> KeyEvent {
    let single = parse_key_string(s).expect("test key should parse");
    match single.key {
        KeyCode::Native(code) => KeyEvent::new(single.key, single.mods).with_native(code),
        _ => KeyEvent::new(single.key, single.mods),
    }
}

/// Press one key, returning whether it was consumed
pub fn press(shortcuts: &mut Shortcuts, host: &mut RecordingHost, s: &str) -> bool {
    shortcuts.dispatch_possible_special_key(&key(s), host)
}

/// Run queued actions until none remain, returning how many ran
pub fn drain(shortcuts: &mut Shortcuts, host: &mut RecordingHost) -> usize {
    let mut ran = 0;
    while shortcuts.tick(host) {
        ran += 1;
    }
    ran
}
