//! Boundary to the embedding application
//!
//! The engine never touches windows, tabs or PTYs directly; everything that
//! leaves the engine goes through [`Host`].

use crate::keymap::KeyEvent;

/// The tab/window pair actions are dispatched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusTarget {
    pub tab: u64,
    pub window: u64,
}

impl FocusTarget {
    pub const fn new(tab: u64, window: u64) -> Self {
        Self { tab, window }
    }
}

/// Services the engine needs from the application around it
///
/// All calls happen on the UI thread, from inside key handling or `tick`.
pub trait Host {
    /// Deliver keys literally to the focused surface (PTY or text input)
    fn send_key_sequence(&mut self, keys: &[KeyEvent]);

    /// Show an error to the user
    fn show_error(&mut self, title: &str, message: &str);

    /// The active tab and window, if there is an active window at all
    fn active_focus(&self) -> Option<FocusTarget>;

    fn beep(&mut self) {}

    /// Called with `true` when a keyboard mode becomes active and `false`
    /// when the last one ends
    fn set_ignore_os_keyboard_processing(&mut self, _on: bool) {}
}

/// A host that discards everything and has no active window
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn send_key_sequence(&mut self, _keys: &[KeyEvent]) {}

    fn show_error(&mut self, title: &str, message: &str) {
        tracing::warn!("{}: {}", title, message);
    }

    fn active_focus(&self) -> Option<FocusTarget> {
        None
    }
}
