//! Default keymap and layered loading
//!
//! The default keymap ships embedded in the binary. Project-local and user
//! keymaps are layered on top of it.

use std::path::Path;

use super::config::{load_keymap_file, parse_keymap_yaml, KeyboardConfig, KeymapError};

/// Default keymap YAML embedded at compile time
const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

/// The embedded default keymap source
pub fn get_default_keymap_yaml() -> &'static str {
    DEFAULT_KEYMAP_YAML
}

/// Parse the embedded default keymap
///
/// Falls back to an empty configuration (plain passthrough) if the embedded
/// file does not parse.
pub fn embedded_keymap() -> KeyboardConfig {
    match parse_keymap_yaml(DEFAULT_KEYMAP_YAML) {
        Ok(config) => {
            tracing::info!(
                "Loaded embedded default keymap ({} bindings)",
                config.bindings.len()
            );
            config
        }
        Err(e) => {
            tracing::warn!("Failed to parse embedded keymap: {}, using empty keymap", e);
            KeyboardConfig::default()
        }
    }
}

/// Load and merge keymaps: defaults + project + user overrides
///
/// Loading order (each layer extends the previous):
/// 1. Embedded default keymap (compiled into binary)
/// 2. keymap.yaml in current directory (project-local overrides)
/// 3. User config at ~/.config/keymode/keymap.yaml
///
/// Layers that fail to load are skipped with a warning.
pub fn load_default_keymap() -> KeyboardConfig {
    let mut config = embedded_keymap();

    if let Ok(local) = load_keymap_file(Path::new("keymap.yaml")) {
        tracing::info!("Merging project keymap.yaml ({} bindings)", local.bindings.len());
        config = merge_bindings(config, local);
    }

    if let Some(user_path) = crate::config_paths::keymap_file() {
        if user_path.exists() {
            match load_keymap_file(&user_path) {
                Ok(user) => {
                    tracing::info!(
                        "Merging user keymap from {} ({} bindings)",
                        user_path.display(),
                        user.bindings.len()
                    );
                    config = merge_bindings(config, user);
                }
                Err(e) => {
                    tracing::warn!("Failed to load user keymap from {}: {}", user_path.display(), e);
                }
            }
        }
    }

    config
}

/// Embedded defaults with one explicit file layered on top
///
/// Unlike [`load_default_keymap`], a broken file is an error.
pub fn load_keymap_with(path: &Path) -> Result<KeyboardConfig, KeymapError> {
    let overlay = load_keymap_file(path)?;
    tracing::info!(
        "Merging keymap from {} ({} bindings)",
        path.display(),
        overlay.bindings.len()
    );
    Ok(merge_bindings(embedded_keymap(), overlay))
}

/// Layer `overlay` on top of `base`
///
/// - Bindings are appended, so an overlay binding shadows a base binding for
///   the same keys while a chord sharing the prefix stays reachable
/// - A binding to `unmap` removes the matching base bindings
/// - Mode options and aliases with the same name are replaced
/// - Global shortcut actions are added
pub fn merge_bindings(base: KeyboardConfig, overlay: KeyboardConfig) -> KeyboardConfig {
    let mut result = base;

    for unmap in overlay.unmapped {
        result.push_binding(unmap);
    }
    for binding in overlay.bindings {
        result.push_binding(binding);
    }
    result.modes.extend(overlay.modes);
    result.aliases.extend(overlay.aliases);
    for action in overlay.global_shortcuts {
        if !result.global_shortcuts.contains(&action) {
            result.global_shortcuts.push(action);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::config::{parse_key_sequence, Binding, ModeConfig};
    use crate::keymap::{OnAction, OnUnknown};

    fn binding(keys: &str, action: &str) -> Binding {
        Binding::new(parse_key_sequence(keys).unwrap(), action)
    }

    fn config_with(bindings: Vec<Binding>) -> KeyboardConfig {
        let mut config = KeyboardConfig::default();
        for b in bindings {
            config.push_binding(b);
        }
        config
    }

    #[test]
    fn test_embedded_keymap_not_empty() {
        let config = embedded_keymap();
        assert!(!config.bindings.is_empty());
        assert!(config.modes.contains_key("resize"));
    }

    #[test]
    fn test_merge_empty_overlay_returns_base() {
        let base = config_with(vec![binding("ctrl+s", "save")]);
        let merged = merge_bindings(base.clone(), KeyboardConfig::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn test_merge_appends_so_overlay_shadows() {
        let base = config_with(vec![binding("ctrl+s", "save")]);
        let user = config_with(vec![binding("ctrl+s", "undo")]);

        let keymaps = merge_bindings(base, user).build();
        let key = parse_key_sequence("ctrl+s").unwrap()[0];
        let defs = keymaps.root.keymap.get(&key).unwrap();
        assert_eq!(defs.last().unwrap().definition, "undo");
    }

    #[test]
    fn test_merge_unmap_removes_binding() {
        let base = config_with(vec![binding("ctrl+s", "save"), binding("ctrl+z", "undo")]);
        let user = config_with(vec![binding("ctrl+s", "unmap")]);

        let merged = merge_bindings(base, user);
        assert_eq!(merged.bindings.len(), 1);
        assert_eq!(merged.bindings[0].action, "undo");
    }

    #[test]
    fn test_merge_unmap_only_touches_same_mode() {
        let base = config_with(vec![
            binding("escape", "pop_keyboard_mode").in_mode("resize"),
            binding("escape", "clear_selection"),
        ]);
        let user = config_with(vec![binding("escape", "unmap").in_mode("resize")]);

        let merged = merge_bindings(base, user);
        assert_eq!(merged.bindings.len(), 1);
        assert_eq!(merged.bindings[0].action, "clear_selection");
    }

    #[test]
    fn test_merge_unmap_then_rebind_in_overlay() {
        let base = config_with(vec![binding("ctrl+s", "save"), binding("ctrl+s>a", "save_all")]);
        let user = config_with(vec![binding("ctrl+s", "unmap"), binding("ctrl+s", "undo")]);

        let merged = merge_bindings(base, user);
        let actions: Vec<&str> = merged.bindings.iter().map(|b| b.action.as_str()).collect();
        assert_eq!(actions, vec!["save_all", "undo"]);
    }

    #[test]
    fn test_unmap_survives_an_intermediate_layer() {
        let base = config_with(vec![binding("ctrl+s", "save")]);
        let project = config_with(vec![binding("ctrl+s", "unmap")]);
        let user = config_with(vec![binding("ctrl+z", "undo")]);

        let merged = merge_bindings(merge_bindings(base, project), user);
        let keymaps = merged.build();
        let key = parse_key_sequence("ctrl+s").unwrap()[0];
        assert!(!keymaps.root.keymap.contains_key(&key));
    }

    #[test]
    fn test_merge_unmap_on_nonexistent_is_noop() {
        let base = config_with(vec![binding("ctrl+s", "save")]);
        let user = config_with(vec![binding("ctrl+x", "unmap")]);

        let merged = merge_bindings(base, user);
        assert_eq!(merged.bindings.len(), 1);
    }

    #[test]
    fn test_merge_mode_options_and_aliases_replace() {
        let mut base = KeyboardConfig::default();
        base.modes.insert("resize".into(), ModeConfig::default());
        base.aliases.insert("launch_tab".into(), "launch --type=tab".into());
        base.global_shortcuts.push("new_tab".into());

        let mut user = KeyboardConfig::default();
        user.modes.insert(
            "resize".into(),
            ModeConfig {
                on_unknown: OnUnknown::Ignore,
                on_action: OnAction::End,
            },
        );
        user.aliases.insert("launch_tab".into(), "launch --cwd=current --type=tab".into());
        user.global_shortcuts.push("new_tab".into());
        user.global_shortcuts.push("close_tab".into());

        let merged = merge_bindings(base, user);
        assert_eq!(merged.modes["resize"].on_unknown, OnUnknown::Ignore);
        assert_eq!(merged.aliases["launch_tab"], "launch --cwd=current --type=tab");
        assert_eq!(merged.global_shortcuts, vec!["new_tab", "close_tab"]);
    }

    #[test]
    fn test_load_keymap_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keymap.yaml");
        std::fs::write(
            &path,
            "bindings:\n  - key: \"ctrl+shift+t\"\n    action: unmap\n",
        )
        .unwrap();

        let config = load_keymap_with(&path).unwrap();
        let key = parse_key_sequence("ctrl+shift+t").unwrap();
        assert!(config.bindings.iter().all(|b| b.keys != key || !b.mode.is_empty()));
    }

    #[test]
    fn test_load_keymap_with_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_keymap_with(&dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(KeymapError::Io(_))));
    }
}
