//! Key dispatch tests: passthrough, fallbacks, chains and error containment

mod common;

use common::{drain, engine, handler_log, key, press, record, record_with, RecordingHost};

use anyhow::anyhow;
use keymode::keymap::{KeyCode, Modifiers};
use keymode::{ActionOutcome, KeyEvent, Scope};

const BASIC: &str = r#"
bindings:
  - key: "ctrl+shift+t"
    action: new_tab
  - key: "?"
    action: show_help
  - key: "ctrl+0x1e"
    action: select_all
  - key: "ctrl+shift+e"
    action: "combine : new_tab : next_layout"
"#;

// ========================================================================
// Passthrough
// ========================================================================

#[test]
fn test_unbound_key_passes_through() {
    let mut shortcuts = engine(BASIC);
    let mut host = RecordingHost::default();

    for k in ["a", "ctrl+k", "shift+enter", "f5"] {
        assert!(!press(&mut shortcuts, &mut host, k), "{} should pass through", k);
    }
    assert!(host.sent.is_empty());
    assert_eq!(shortcuts.mode_depth(), 0);
}

#[test]
fn test_modifier_key_passes_through() {
    let mut shortcuts = engine(BASIC);
    let mut host = RecordingHost::default();
    let shift = KeyEvent::new(KeyCode::Shift, Modifiers::SHIFT);
    assert!(!shortcuts.dispatch_possible_special_key(&shift, &mut host));
}

#[test]
fn test_binding_to_unknown_action_passes_through() {
    let mut shortcuts = engine(BASIC);
    let mut host = RecordingHost::default();

    // Nothing registered for new_tab
    assert!(!press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert!(host.errors.is_empty());
}

// ========================================================================
// Lookup fallbacks
// ========================================================================

#[test]
fn test_shift_fallback() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["show_help"], &log);
    let mut host = RecordingHost::default();

    let ev = KeyEvent::char('/', Modifiers::SHIFT).with_shifted(KeyCode::Char('?'));
    assert!(shortcuts.dispatch_possible_special_key(&ev, &mut host));
    assert_eq!(*log.borrow(), vec!["show_help"]);
}

#[test]
fn test_native_fallback() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["select_all"], &log);
    let mut host = RecordingHost::default();

    // A layout where the key at code 0x1e produces "q"
    let ev = KeyEvent::char('q', Modifiers::CTRL).with_native(0x1e);
    assert!(shortcuts.dispatch_possible_special_key(&ev, &mut host));
    assert_eq!(*log.borrow(), vec!["select_all"]);
}

#[test]
fn test_unknown_modifier_bits_ignored() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab"], &log);
    let mut host = RecordingHost::default();

    let mods = Modifiers::from_bits_retain((Modifiers::CTRL | Modifiers::SHIFT).bits() | 0x4000);
    let ev = KeyEvent::char('t', mods);
    assert!(shortcuts.dispatch_possible_special_key(&ev, &mut host));
    assert_eq!(*log.borrow(), vec!["new_tab"]);
}

#[test]
fn test_resolution_is_idempotent() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert_eq!(*log.borrow(), vec!["new_tab", "new_tab"]);
}

#[test]
fn test_most_recent_binding_wins() {
    let mut shortcuts = engine(
        r#"
bindings:
  - key: "ctrl+t"
    action: new_tab
  - key: "ctrl+t"
    action: new_window
"#,
    );
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab", "new_window"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+t"));
    assert_eq!(*log.borrow(), vec!["new_window"]);
}

// ========================================================================
// Scopes
// ========================================================================

#[test]
fn test_scope_priority() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    let window_log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab"], &window_log);
    record(&mut shortcuts, Scope::Application, &["new_tab"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert_eq!(log.borrow().len(), 1);
    assert!(window_log.borrow().is_empty());
}

#[test]
fn test_declined_action_passes_through() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    let window_log = handler_log();
    record_with(&mut shortcuts, Scope::Tab, &["new_tab"], &log, ActionOutcome::Declined);
    record(&mut shortcuts, Scope::Window, &["new_tab"], &window_log);
    let mut host = RecordingHost::default();

    assert!(!press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert_eq!(log.borrow().len(), 1);
    assert!(window_log.borrow().is_empty(), "decline does not fall through to later scopes");
}

#[test]
fn test_window_actions_need_a_window() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab"], &log);
    let mut host = RecordingHost::without_window();

    assert!(!press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_handler_sees_focus() {
    let mut shortcuts = engine(BASIC);
    let seen = handler_log();
    let log = seen.clone();
    shortcuts.register(Scope::Tab, "new_tab", move |cx| {
        let focus = cx.focus.expect("tab actions get a focus");
        log.borrow_mut().push(format!("{}/{}", focus.tab, focus.window));
        Ok(ActionOutcome::Consumed)
    });
    let mut host = RecordingHost {
        focus: Some(keymode::FocusTarget::new(7, 9)),
        ..RecordingHost::default()
    };

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert_eq!(*seen.borrow(), vec!["7/9"]);
}

// ========================================================================
// Chains
// ========================================================================

#[test]
fn test_chain_ordering() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab", "next_layout"], &log);
    let mut host = RecordingHost::default();

    assert!(shortcuts.combine("combine : new_tab : next_layout", &mut host));
    assert_eq!(*log.borrow(), vec!["new_tab"], "only the first action runs inline");
    assert!(shortcuts.has_pending_actions());

    assert_eq!(drain(&mut shortcuts, &mut host), 1);
    assert_eq!(*log.borrow(), vec!["new_tab", "next_layout"]);
    assert!(!shortcuts.has_pending_actions());
}

#[test]
fn test_chain_from_key() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab", "next_layout"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+e"));
    assert_eq!(log.borrow().len(), 1);
    assert!(shortcuts.tick(&mut host));
    assert!(!shortcuts.tick(&mut host));
    assert_eq!(*log.borrow(), vec!["new_tab", "next_layout"]);
}

#[test]
fn test_chain_follows_focus_change() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    for name in ["new_tab", "next_layout"] {
        let log = log.clone();
        shortcuts.register(Scope::Tab, name, move |cx| {
            let tab = cx.focus.map_or(0, |f| f.tab);
            log.borrow_mut().push(format!("{} tab={}", cx.action, tab));
            Ok(ActionOutcome::Consumed)
        });
    }
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+e"));
    // The new tab becomes active before the next action runs
    host.focus = Some(keymode::FocusTarget::new(2, 5));
    drain(&mut shortcuts, &mut host);
    assert_eq!(*log.borrow(), vec!["new_tab tab=1", "next_layout tab=2"]);
}

#[test]
fn test_chain_one_action_per_tick() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["a", "b", "c", "d"], &log);
    let mut host = RecordingHost::default();

    shortcuts.combine("combine , a , b , c , d", &mut host);
    for expected in 2..=4 {
        assert!(shortcuts.tick(&mut host));
        assert_eq!(log.borrow().len(), expected);
    }
    assert!(!shortcuts.tick(&mut host));
}

#[test]
fn test_chain_sees_effects_of_previous_action() {
    let mut shortcuts = engine(
        r#"
modes:
  resize: {}
bindings:
  - key: "left"
    mode: resize
    action: resize_window narrower
"#,
    );
    let log = handler_log();
    let depth_log = log.clone();
    shortcuts.register(Scope::Window, "report_depth", move |cx| {
        depth_log.borrow_mut().push(format!("depth {}", cx.stack.len()));
        Ok(ActionOutcome::Consumed)
    });
    let mut host = RecordingHost::default();

    assert!(shortcuts.combine("combine : push_keyboard_mode resize : report_depth", &mut host));
    drain(&mut shortcuts, &mut host);
    assert_eq!(*log.borrow(), vec!["depth 1"]);
}

#[test]
fn test_alias_chain() {
    let mut shortcuts = engine(
        r#"
aliases:
  tab_and_layout: "combine : new_tab : next_layout"
bindings:
  - key: "ctrl+shift+l"
    action: tab_and_layout
"#,
    );
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab", "next_layout"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+l"));
    drain(&mut shortcuts, &mut host);
    assert_eq!(*log.borrow(), vec!["new_tab", "next_layout"]);
}

// ========================================================================
// Error containment
// ========================================================================

#[test]
fn test_handler_error_is_contained() {
    let mut shortcuts = engine(
        r#"
modes:
  resize: {}
bindings:
  - key: "ctrl+shift+t"
    action: new_tab
  - key: "left"
    mode: resize
    action: explode
"#,
    );
    shortcuts.register(Scope::Window, "new_tab", |_| Err(anyhow!("no shell")));
    shortcuts.register(Scope::Window, "explode", |_| Err(anyhow!("boom")));
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+t"));
    assert_eq!(host.errors.len(), 1);
    assert_eq!(host.errors[0].0, "Key action failed");
    assert!(host.errors[0].1.contains("new_tab"));
    assert!(host.errors[0].1.contains("no shell"));

    shortcuts.push_keyboard_mode("resize", &mut host).unwrap();
    let depth = shortcuts.mode_depth();
    assert!(press(&mut shortcuts, &mut host, "left"));
    assert_eq!(shortcuts.mode_depth(), depth);
    assert_eq!(host.errors.len(), 2);
}

#[test]
fn test_malformed_chain_reported() {
    let mut shortcuts = engine(
        r#"
bindings:
  - key: "ctrl+shift+b"
    action: "combine : new_tab :"
"#,
    );
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["new_tab"], &log);
    let mut host = RecordingHost::default();

    assert!(press(&mut shortcuts, &mut host, "ctrl+shift+b"));
    assert!(log.borrow().is_empty(), "nothing runs when expansion fails");
    assert_eq!(host.errors[0].0, "Failed to parse action");
}

#[test]
fn test_error_mid_chain_does_not_stop_the_rest() {
    let mut shortcuts = engine(BASIC);
    let log = handler_log();
    record(&mut shortcuts, Scope::Window, &["a", "c"], &log);
    shortcuts.register(Scope::Window, "b", |_| Err(anyhow!("boom")));
    let mut host = RecordingHost::default();

    assert!(shortcuts.combine("combine : a : b : c", &mut host));
    drain(&mut shortcuts, &mut host);
    assert_eq!(*log.borrow(), vec!["a", "c"]);
    assert_eq!(host.errors.len(), 1);
}

#[test]
fn test_key_helper_round_trip() {
    assert_eq!(key("ctrl+shift+t").to_string(), "ctrl+shift+t");
}
