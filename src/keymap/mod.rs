//! Configurable keyboard mapping
//!
//! This module provides the data side of shortcut handling:
//! - Normalized key identities with platform modifier handling
//! - Keymaps that hold single keys and multi-key sequences (chords)
//! - Named keyboard modes and the stack they are pushed onto
//! - YAML configuration with layered user overrides
//!
//! # Architecture
//!
//! ```text
//! winit key event → KeyEvent → resolve_candidates() → select() → KeyDefinition
//! ```
//!
//! # Loading Keymaps
//!
//! ```ignore
//! // Embedded defaults plus project and user overrides
//! let keymaps = load_default_keymap().build();
//!
//! // Or a single YAML file
//! let keymaps = load_keymap_file(Path::new("keymap.yaml"))?.build();
//! ```

mod config;
mod defaults;
mod definition;
#[allow(clippy::module_inception)]
mod keymap;
mod mode;
mod types;
mod winit_adapter;

pub use config::{
    load_keymap_file, parse_key_sequence, parse_key_string, parse_keymap_yaml,
    resolve_global_shortcuts, Binding, BindingConfig, KeyboardConfig, KeymapConfig, KeymapError,
    Keymaps, ModeConfig, UNMAP_ACTION,
};
pub use defaults::{
    embedded_keymap, get_default_keymap_yaml, load_default_keymap, load_keymap_with,
    merge_bindings,
};
pub use definition::KeyDefinition;
pub use keymap::{resolve_candidates, select, KeyMap};
pub use mode::{
    KeyboardMode, ModeError, ModeInstance, ModeStack, ModeState, OnAction, OnUnknown, StackedMode,
};
pub use types::{KeyCode, KeyEvent, Modifiers, SingleKey};
pub use winit_adapter::{key_event_from_winit, modifiers_from_winit};
