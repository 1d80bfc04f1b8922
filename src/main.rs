//! keymode command-line front end
//!
//! Usage:
//!   keymode check
//!   keymode check --config my-keymap.yaml
//!   keymode replay ctrl+shift+a m
//!   RUST_LOG=keyboard=debug keymode replay ctrl+shift+r left escape

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Parser;

use keymode::host::{FocusTarget, Host};
use keymode::keymap::{
    load_default_keymap, load_keymap_with, parse_key_string, KeyCode, KeyEvent, KeyboardConfig,
};
use keymode::{ActionOutcome, Scope, Shortcuts};

mod cli;

use cli::{CliArgs, Command};

/// Host that prints everything the engine does
struct ConsoleHost {
    focus: FocusTarget,
}

impl Host for ConsoleHost {
    fn send_key_sequence(&mut self, keys: &[KeyEvent]) {
        let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
        println!("  replay: {}", keys.join(" "));
    }

    fn show_error(&mut self, title: &str, message: &str) {
        eprintln!("  error: {}: {}", title, message.replace('\n', " | "));
    }

    fn active_focus(&self) -> Option<FocusTarget> {
        Some(self.focus)
    }

    fn beep(&mut self) {
        println!("  beep");
    }

    fn set_ignore_os_keyboard_processing(&mut self, on: bool) {
        tracing::debug!(target: "keyboard", on, "ignore OS keyboard processing");
    }
}

fn load_config(args: &CliArgs) -> Result<KeyboardConfig> {
    match args.command.config() {
        Some(path) => load_keymap_with(path)
            .with_context(|| format!("Failed to load keymap from {}", path.display())),
        None => Ok(load_default_keymap()),
    }
}

fn check(config: &KeyboardConfig) {
    let shortcuts = Shortcuts::from_config(config);

    println!("root: {} keys", shortcuts.root_keymap().len());
    for (name, mode) in shortcuts.keyboard_modes() {
        println!(
            "mode {}: {} keys (on_unknown: {:?}, on_action: {:?})",
            name,
            mode.keymap.len(),
            mode.on_unknown,
            mode.on_action
        );
    }
    if !config.aliases.is_empty() {
        println!("aliases:");
        for (name, expansion) in &config.aliases {
            println!("  {} = {}", name, expansion);
        }
    }
    if !shortcuts.global_shortcuts().is_empty() {
        println!("global shortcuts:");
        for (action, key) in shortcuts.global_shortcuts() {
            println!("  {} → {}", key.display_string(), action);
        }
    }
}

/// Every action name reachable from the configured bindings
fn configured_action_names(shortcuts: &Shortcuts, config: &KeyboardConfig) -> BTreeSet<String> {
    let aliases = shortcuts.dispatcher().aliases();
    config
        .bindings
        .iter()
        .map(|b| b.action.as_str())
        .chain(config.global_shortcuts.iter().map(String::as_str))
        .filter_map(|definition| aliases.resolve(definition).ok())
        .flatten()
        .map(|action| action.name)
        .collect()
}

fn replay(config: &KeyboardConfig, keys: &[String]) -> Result<()> {
    let mut shortcuts = Shortcuts::from_config(config);
    for name in configured_action_names(&shortcuts, config) {
        if shortcuts.dispatcher().registry(Scope::Application).contains(&name) {
            continue;
        }
        shortcuts.register(Scope::Window, name, |cx| {
            println!("  action: {}", cx.action);
            Ok(ActionOutcome::Consumed)
        });
    }

    let mut host = ConsoleHost {
        focus: FocusTarget::new(1, 1),
    };

    for key in keys {
        let single = parse_key_string(key).with_context(|| format!("Invalid key {:?}", key))?;
        let ev = match single.key {
            KeyCode::Native(code) => KeyEvent::new(single.key, single.mods).with_native(code),
            _ => KeyEvent::new(single.key, single.mods),
        };

        println!("{}", ev);
        let consumed = shortcuts.dispatch_possible_special_key(&ev, &mut host);
        while shortcuts.has_pending_actions() {
            shortcuts.tick(&mut host);
        }

        if !consumed {
            println!("  passthrough: {}", ev);
        }
        if let Some(pending) = shortcuts.pending_sequence_display() {
            println!("  sequence: {}", pending);
        } else if !shortcuts.active_mode_name().is_empty() {
            println!("  mode: {}", shortcuts.active_mode_name());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();

    keymode::tracing::init();

    let config = load_config(&args)?;
    match &args.command {
        Command::Check { .. } => check(&config),
        Command::Replay { keys, .. } => replay(&config, keys)?,
    }

    Ok(())
}
