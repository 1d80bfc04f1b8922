//! YAML configuration parsing for keymaps
//!
//! Parses keymap.yaml files into bindings, mode options, action aliases and
//! the list of actions that get global shortcuts.

use std::path::Path;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::definition::KeyDefinition;
use super::keymap::KeyMap;
use super::mode::{KeyboardMode, OnAction, OnUnknown};
use super::types::{KeyCode, Modifiers, SingleKey};
use crate::dispatch::AliasMap;

/// Action text that removes earlier bindings instead of adding one
pub const UNMAP_ACTION: &str = "unmap";

/// Root structure of a keymap YAML file
#[derive(Debug, Default, Deserialize)]
pub struct KeymapConfig {
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
    #[serde(default)]
    pub modes: IndexMap<String, ModeConfig>,
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    #[serde(default)]
    pub global_shortcuts: Option<Vec<String>>,
}

/// A single binding entry from YAML
#[derive(Debug, Deserialize)]
pub struct BindingConfig {
    pub key: String,
    pub action: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub when_focus_on: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Behavior flags of a named mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ModeConfig {
    #[serde(default)]
    pub on_unknown: OnUnknown,
    #[serde(default)]
    pub on_action: OnAction,
}

/// A validated binding: which mode, which keys, which action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Mode name, empty for the root mode
    pub mode: String,
    pub keys: Vec<SingleKey>,
    pub action: String,
    pub when_focus_on: Option<String>,
}

impl Binding {
    pub fn new(keys: Vec<SingleKey>, action: impl Into<String>) -> Self {
        Self {
            mode: String::new(),
            keys,
            action: action.into(),
            when_focus_on: None,
        }
    }

    /// Place this binding in a named mode (builder pattern)
    pub fn in_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn is_unmap(&self) -> bool {
        self.action == UNMAP_ACTION
    }

    /// Same mode and same key sequence
    fn same_target(&self, other: &Binding) -> bool {
        self.mode == other.mode && self.keys == other.keys
    }

    fn to_definition(&self) -> Option<KeyDefinition> {
        let definition = KeyDefinition::sequence(&self.keys, self.action.clone())?;
        Some(match &self.when_focus_on {
            Some(context) => definition.when_focus_on(context.clone()),
            None => definition,
        })
    }
}

/// One parsed keymap layer (embedded defaults, project file or user file)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardConfig {
    pub bindings: Vec<Binding>,
    pub modes: IndexMap<String, ModeConfig>,
    pub aliases: IndexMap<String, String>,
    pub global_shortcuts: Vec<String>,
    /// Unmap entries of this layer, applied to the layers below it on merge
    pub unmapped: Vec<Binding>,
}

/// Keymaps ready for the engine
#[derive(Debug, Clone, Default)]
pub struct Keymaps {
    pub root: KeyboardMode,
    pub modes: IndexMap<String, Rc<KeyboardMode>>,
    /// Action name to the key that triggers it globally
    pub global_shortcuts: IndexMap<String, SingleKey>,
    pub aliases: AliasMap,
}

impl KeyboardConfig {
    /// Add a binding, or apply it as an unmap of earlier ones
    ///
    /// Unmaps are remembered so that merging this layer onto another one
    /// removes the matching bindings there too.
    pub fn push_binding(&mut self, binding: Binding) {
        if binding.is_unmap() {
            self.bindings.retain(|b| !b.same_target(&binding));
            self.unmapped.push(binding);
            return;
        }
        self.bindings.push(binding);
    }

    /// Build the root keymap, the named modes and the global shortcut table
    pub fn build(&self) -> Keymaps {
        let mut root = KeyMap::new();
        let mut modes: IndexMap<String, KeyboardMode> = self
            .modes
            .iter()
            .map(|(name, options)| {
                let mode = KeyboardMode {
                    name: name.clone(),
                    keymap: KeyMap::new(),
                    on_unknown: options.on_unknown,
                    on_action: options.on_action,
                };
                (name.clone(), mode)
            })
            .collect();

        let mut effective: Vec<&Binding> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            if binding.is_unmap() {
                effective.retain(|b| !b.same_target(binding));
            } else {
                effective.push(binding);
            }
        }

        for binding in effective {
            let Some(definition) = binding.to_definition() else {
                continue;
            };
            if binding.mode.is_empty() {
                root.add(definition);
            } else {
                modes
                    .entry(binding.mode.clone())
                    .or_insert_with(|| KeyboardMode::new(binding.mode.clone()))
                    .keymap
                    .add(definition);
            }
        }

        let global_shortcuts = resolve_global_shortcuts(&root, &self.global_shortcuts);
        let mut aliases = AliasMap::new();
        for (name, expansion) in &self.aliases {
            aliases.insert(name.clone(), expansion.clone());
        }

        Keymaps {
            root: KeyboardMode::root(root),
            modes: modes
                .into_iter()
                .map(|(name, mode)| (name, Rc::new(mode)))
                .collect(),
            global_shortcuts,
            aliases,
        }
    }
}

/// Pick the key for each action that should get a global shortcut
///
/// Only the active (last) definition of each root key is considered, and
/// only if it is a plain single key without a focus restriction. When several
/// keys qualify for one action, the most recently configured one wins.
pub fn resolve_global_shortcuts(root: &KeyMap, actions: &[String]) -> IndexMap<String, SingleKey> {
    let mut by_action: IndexMap<String, Vec<SingleKey>> = IndexMap::new();
    for (key, definitions) in root.iter() {
        let Some(active) = definitions.last() else {
            continue;
        };
        if active.is_suitable_for_global_shortcut() {
            let normalized = active.definition.split_whitespace().collect::<Vec<_>>().join(" ");
            by_action.entry(normalized).or_default().push(*key);
        }
    }

    let mut shortcuts = IndexMap::new();
    for action in actions {
        let normalized = action.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Some(key) = by_action.get(&normalized).and_then(|keys| keys.last()) {
            shortcuts.insert(action.clone(), *key);
        }
    }
    shortcuts
}

/// Load keymap configuration from a YAML file
pub fn load_keymap_file(path: &Path) -> Result<KeyboardConfig, KeymapError> {
    let content = std::fs::read_to_string(path)?;

    parse_keymap_yaml(&content)
}

/// Parse keymap configuration from YAML string
pub fn parse_keymap_yaml(yaml: &str) -> Result<KeyboardConfig, KeymapError> {
    let raw: KeymapConfig = serde_yaml::from_str(yaml)?;

    let current_platform = get_current_platform();
    let mut config = KeyboardConfig {
        bindings: Vec::with_capacity(raw.bindings.len()),
        modes: IndexMap::new(),
        aliases: raw.aliases,
        global_shortcuts: raw.global_shortcuts.unwrap_or_default(),
        unmapped: Vec::new(),
    };

    for (name, options) in raw.modes {
        if !is_valid_mode_name(&name) {
            return Err(KeymapError::InvalidMode(name));
        }
        config.modes.insert(name, options);
    }

    for entry in raw.bindings {
        // Skip if platform-specific and doesn't match current platform
        if let Some(ref platform) = entry.platform {
            if platform != current_platform {
                continue;
            }
        }

        let keys = parse_key_sequence(&entry.key)?;
        let action = entry.action.trim().to_string();
        if action.is_empty() {
            return Err(KeymapError::InvalidAction {
                key: entry.key,
                reason: "empty action".to_string(),
            });
        }

        let mode = entry.mode.unwrap_or_default();
        if !mode.is_empty() && !is_valid_mode_name(&mode) {
            return Err(KeymapError::InvalidMode(mode));
        }

        config.push_binding(Binding {
            mode,
            keys,
            action,
            when_focus_on: entry.when_focus_on.filter(|c| !c.trim().is_empty()),
        });
    }

    Ok(config)
}

fn is_valid_mode_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// Parse a key sequence like "ctrl+x>ctrl+s" into its keys
pub fn parse_key_sequence(sequence: &str) -> Result<Vec<SingleKey>, KeymapError> {
    sequence.split('>').map(parse_key_string).collect()
}

/// Parse a key string like "ctrl+shift+s" into a SingleKey
pub fn parse_key_string(key_str: &str) -> Result<SingleKey, KeymapError> {
    let key_str = key_str.trim();
    if key_str.is_empty() {
        return Err(KeymapError::InvalidKey("Empty key".to_string()));
    }

    let mut mods = Modifiers::NONE;
    let mut key_part = None;

    for part in key_str.split('+') {
        let part_lower = part.trim().to_lowercase();
        match part_lower.as_str() {
            "cmd" => {
                // Platform command key
                mods |= Modifiers::cmd();
            }
            "ctrl" | "control" => {
                mods |= Modifiers::CTRL;
            }
            "shift" => {
                mods |= Modifiers::SHIFT;
            }
            "alt" | "option" | "opt" => {
                mods |= Modifiers::ALT;
            }
            "super" | "win" | "logo" => {
                mods |= Modifiers::SUPER;
            }
            "hyper" => {
                mods |= Modifiers::HYPER;
            }
            "meta" => {
                mods |= Modifiers::META;
            }
            "caps_lock" => {
                mods |= Modifiers::CAPS_LOCK;
            }
            "num_lock" => {
                mods |= Modifiers::NUM_LOCK;
            }
            "" => {
                return Err(KeymapError::InvalidKey(format!(
                    "Empty component in key: {}",
                    key_str
                )));
            }
            _ => {
                // This should be the key itself
                if key_part.is_some() {
                    return Err(KeymapError::InvalidKey(format!(
                        "Multiple keys in binding: {}",
                        key_str
                    )));
                }
                key_part = Some(parse_key_code(part.trim())?);
            }
        }
    }

    let key = key_part
        .ok_or_else(|| KeymapError::InvalidKey(format!("No key found in binding: {}", key_str)))?;

    Ok(match key {
        KeyCode::Native(code) => SingleKey::native(code, mods),
        key => SingleKey::new(key, mods),
    })
}

/// Parse a key code from string
fn parse_key_code(key: &str) -> Result<KeyCode, KeymapError> {
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::char(c));
    }

    let lower = key.to_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        return u32::from_str_radix(hex, 16)
            .map(KeyCode::Native)
            .map_err(|_| KeymapError::InvalidKey(format!("Invalid native key code: {}", key)));
    }

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=24).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    // Named keys
    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "escape" | "esc" => Ok(KeyCode::Escape),
        "tab" => Ok(KeyCode::Tab),
        "backspace" | "back" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "space" => Ok(KeyCode::Space),
        "plus" => Ok(KeyCode::Char('+')),
        "greater" | "gt" => Ok(KeyCode::Char('>')),

        "up" | "arrowup" => Ok(KeyCode::Up),
        "down" | "arrowdown" => Ok(KeyCode::Down),
        "left" | "arrowleft" => Ok(KeyCode::Left),
        "right" | "arrowright" => Ok(KeyCode::Right),

        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "page_up" | "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "page_down" | "pagedown" | "pgdown" | "pgdn" => Ok(KeyCode::PageDown),
        "insert" | "ins" => Ok(KeyCode::Insert),

        // Numpad
        "numpad0" | "num0" => Ok(KeyCode::Numpad0),
        "numpad1" | "num1" => Ok(KeyCode::Numpad1),
        "numpad2" | "num2" => Ok(KeyCode::Numpad2),
        "numpad3" | "num3" => Ok(KeyCode::Numpad3),
        "numpad4" | "num4" => Ok(KeyCode::Numpad4),
        "numpad5" | "num5" => Ok(KeyCode::Numpad5),
        "numpad6" | "num6" => Ok(KeyCode::Numpad6),
        "numpad7" | "num7" => Ok(KeyCode::Numpad7),
        "numpad8" | "num8" => Ok(KeyCode::Numpad8),
        "numpad9" | "num9" => Ok(KeyCode::Numpad9),
        "numpad_add" | "numadd" | "numplus" => Ok(KeyCode::NumpadAdd),
        "numpad_subtract" | "numsub" | "numminus" => Ok(KeyCode::NumpadSubtract),
        "numpad_multiply" | "nummul" => Ok(KeyCode::NumpadMultiply),
        "numpad_divide" | "numdiv" => Ok(KeyCode::NumpadDivide),
        "numpad_enter" | "numenter" => Ok(KeyCode::NumpadEnter),
        "numpad_decimal" | "numdot" => Ok(KeyCode::NumpadDecimal),

        _ => Err(KeymapError::InvalidKey(format!("Unknown key: {}", key))),
    }
}

/// Get the current platform identifier
fn get_current_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "linux"
    }
}

/// Errors that can occur when parsing keymaps
#[derive(Debug, thiserror::Error)]
pub enum KeymapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Invalid mode: {0:?}")]
    InvalidMode(String),
    #[error("Invalid action for {key}: {reason}")]
    InvalidAction { key: String, reason: String },
}
