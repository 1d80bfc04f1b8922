//! Adapter to convert winit key events to our KeyEvent type

use winit::keyboard::{Key, KeyCode as WinitKeyCode, ModifiersState, NamedKey, PhysicalKey};

use super::types::{KeyCode, KeyEvent, Modifiers};

/// Convert winit key event data to our KeyEvent type
///
/// `logical_key` is the key as produced with the current modifiers and
/// `unmodified_key` the same key without them (winit's
/// `key_without_modifiers`). When shift is held and the two differ, the
/// logical key becomes the event's shifted key.
///
/// Returns None if the key cannot be mapped (e.g., dead keys)
pub fn key_event_from_winit(
    logical_key: &Key,
    unmodified_key: &Key,
    physical_key: PhysicalKey,
    state: ModifiersState,
) -> Option<KeyEvent> {
    let mods = modifiers_from_winit(state);

    // Numpad keys are identified physically so they stay distinct from the
    // digits row
    let key = numpad_key(physical_key)
        .or_else(|| map_logical(unmodified_key))
        .or_else(|| map_logical(logical_key))?;

    let mut event = KeyEvent::new(key, mods).with_native(native_code(physical_key));
    if mods.shift() {
        if let Some(shifted) = map_logical(logical_key).filter(|k| *k != key) {
            event = event.with_shifted(shifted);
        }
    }
    Some(event)
}

/// Convert winit modifier state to our Modifiers
pub fn modifiers_from_winit(state: ModifiersState) -> Modifiers {
    let mut mods = Modifiers::NONE;
    mods.set(Modifiers::SHIFT, state.shift_key());
    mods.set(Modifiers::CTRL, state.control_key());
    mods.set(Modifiers::ALT, state.alt_key());
    mods.set(Modifiers::SUPER, state.super_key());
    mods
}

fn map_logical(key: &Key) -> Option<KeyCode> {
    match key {
        Key::Named(named) => map_named(*named),
        // Character keys - normalize to lowercase
        Key::Character(s) => {
            let c = s.chars().next()?;
            Some(KeyCode::char(c))
        }
        _ => None,
    }
}

fn map_named(named: NamedKey) -> Option<KeyCode> {
    let key = match named {
        NamedKey::Enter => KeyCode::Enter,
        NamedKey::Escape => KeyCode::Escape,
        NamedKey::Tab => KeyCode::Tab,
        NamedKey::Backspace => KeyCode::Backspace,
        NamedKey::Delete => KeyCode::Delete,
        NamedKey::Space => KeyCode::Space,

        // Arrows
        NamedKey::ArrowUp => KeyCode::Up,
        NamedKey::ArrowDown => KeyCode::Down,
        NamedKey::ArrowLeft => KeyCode::Left,
        NamedKey::ArrowRight => KeyCode::Right,

        // Navigation
        NamedKey::Home => KeyCode::Home,
        NamedKey::End => KeyCode::End,
        NamedKey::PageUp => KeyCode::PageUp,
        NamedKey::PageDown => KeyCode::PageDown,
        NamedKey::Insert => KeyCode::Insert,

        // Function keys
        NamedKey::F1 => KeyCode::F(1),
        NamedKey::F2 => KeyCode::F(2),
        NamedKey::F3 => KeyCode::F(3),
        NamedKey::F4 => KeyCode::F(4),
        NamedKey::F5 => KeyCode::F(5),
        NamedKey::F6 => KeyCode::F(6),
        NamedKey::F7 => KeyCode::F(7),
        NamedKey::F8 => KeyCode::F(8),
        NamedKey::F9 => KeyCode::F(9),
        NamedKey::F10 => KeyCode::F(10),
        NamedKey::F11 => KeyCode::F(11),
        NamedKey::F12 => KeyCode::F(12),
        NamedKey::F13 => KeyCode::F(13),
        NamedKey::F14 => KeyCode::F(14),
        NamedKey::F15 => KeyCode::F(15),
        NamedKey::F16 => KeyCode::F(16),
        NamedKey::F17 => KeyCode::F(17),
        NamedKey::F18 => KeyCode::F(18),
        NamedKey::F19 => KeyCode::F(19),
        NamedKey::F20 => KeyCode::F(20),
        NamedKey::F21 => KeyCode::F(21),
        NamedKey::F22 => KeyCode::F(22),
        NamedKey::F23 => KeyCode::F(23),
        NamedKey::F24 => KeyCode::F(24),

        // Modifiers on their own
        NamedKey::Shift => KeyCode::Shift,
        NamedKey::Control => KeyCode::Control,
        NamedKey::Alt | NamedKey::AltGraph => KeyCode::Alt,
        NamedKey::Super => KeyCode::Super,
        NamedKey::Hyper => KeyCode::Hyper,
        NamedKey::Meta => KeyCode::Meta,
        NamedKey::CapsLock => KeyCode::CapsLock,
        NamedKey::NumLock => KeyCode::NumLock,

        _ => return None,
    };
    Some(key)
}

fn numpad_key(physical_key: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = physical_key else {
        return None;
    };
    let key = match code {
        WinitKeyCode::Numpad0 => KeyCode::Numpad0,
        WinitKeyCode::Numpad1 => KeyCode::Numpad1,
        WinitKeyCode::Numpad2 => KeyCode::Numpad2,
        WinitKeyCode::Numpad3 => KeyCode::Numpad3,
        WinitKeyCode::Numpad4 => KeyCode::Numpad4,
        WinitKeyCode::Numpad5 => KeyCode::Numpad5,
        WinitKeyCode::Numpad6 => KeyCode::Numpad6,
        WinitKeyCode::Numpad7 => KeyCode::Numpad7,
        WinitKeyCode::Numpad8 => KeyCode::Numpad8,
        WinitKeyCode::Numpad9 => KeyCode::Numpad9,
        WinitKeyCode::NumpadAdd => KeyCode::NumpadAdd,
        WinitKeyCode::NumpadSubtract => KeyCode::NumpadSubtract,
        WinitKeyCode::NumpadMultiply => KeyCode::NumpadMultiply,
        WinitKeyCode::NumpadDivide => KeyCode::NumpadDivide,
        WinitKeyCode::NumpadEnter => KeyCode::NumpadEnter,
        WinitKeyCode::NumpadDecimal => KeyCode::NumpadDecimal,
        _ => return None,
    };
    Some(key)
}

/// Platform scancode of a physical key, 0 when unknown
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
fn native_code(physical_key: PhysicalKey) -> u32 {
    use winit::platform::scancode::PhysicalKeyExtScancode;

    physical_key.to_scancode().unwrap_or(0)
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn native_code(_physical_key: PhysicalKey) -> u32 {
    0
}
