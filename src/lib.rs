//! keymode - modal keyboard shortcut engine
//!
//! This crate turns key events from the window system into application
//! actions: global shortcuts, per-mode shortcut tables, multi-key chords and
//! plain passthrough to the focused surface.

pub mod config_paths;
pub mod dispatch;
pub mod host;
pub mod keymap;
pub mod shortcuts;
pub mod tracing;

// Re-export commonly used types
pub use dispatch::{ActionCx, ActionOutcome, Scope};
pub use host::{FocusTarget, Host};
pub use keymap::{KeyEvent, KeyboardConfig, Keymaps};
pub use shortcuts::Shortcuts;
