//! The shortcut engine
//!
//! Owns the root keymap, the named modes, the global shortcut table, the
//! mode stack and the dispatcher, and turns each key event into either an
//! action, a step of a chord, or passthrough.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::dispatch::{ActionCx, ActionOutcome, DispatchEnv, Dispatched, Dispatcher, Scope};
use crate::host::Host;
use crate::keymap::{
    resolve_candidates, select, KeyDefinition, KeyEvent, KeyMap, KeyboardConfig, KeyboardMode,
    Keymaps, ModeError, ModeInstance, ModeStack, ModeState, OnAction, OnUnknown, SingleKey,
    StackedMode,
};

/// What is active when a key arrives
#[derive(Clone, Copy)]
enum Active {
    Root,
    Static {
        instance: ModeInstance,
        on_unknown: OnUnknown,
        on_action: OnAction,
    },
    Sequence {
        instance: ModeInstance,
    },
}

/// Keyboard shortcut resolution and modal dispatch
#[derive(Debug)]
pub struct Shortcuts {
    root: KeyboardMode,
    modes: IndexMap<String, Rc<KeyboardMode>>,
    global_shortcuts: IndexMap<String, SingleKey>,
    global_map: KeyMap,
    stack: ModeStack,
    dispatcher: Dispatcher,
}

impl Shortcuts {
    pub fn new(keymaps: Keymaps) -> Self {
        let mut shortcuts = Self {
            root: KeyboardMode::default(),
            modes: IndexMap::new(),
            global_shortcuts: IndexMap::new(),
            global_map: KeyMap::new(),
            stack: ModeStack::new(),
            dispatcher: Dispatcher::new(),
        };
        shortcuts.update_keymap(keymaps);
        shortcuts
    }

    pub fn from_config(config: &KeyboardConfig) -> Self {
        Self::new(config.build())
    }

    /// Replace the keymaps after a configuration reload
    ///
    /// Modes already on the stack keep the tables they were pushed with.
    pub fn update_keymap(&mut self, keymaps: Keymaps) {
        let Keymaps {
            mut root,
            modes,
            global_shortcuts,
            aliases,
        } = keymaps;

        let mut global_map = KeyMap::new();
        for (action, key) in &global_shortcuts {
            root.keymap.remove(key);
            global_map.add(KeyDefinition::new(*key, action.clone()));
        }

        tracing::debug!(
            target: "keyboard",
            root_keys = root.keymap.len(),
            modes = modes.len(),
            global_shortcuts = global_shortcuts.len(),
            "keymap updated"
        );

        self.root = root;
        self.modes = modes;
        self.global_shortcuts = global_shortcuts;
        self.global_map = global_map;
        self.dispatcher.set_aliases(aliases);
    }

    /// Install an action handler in one of the scopes
    pub fn register<F>(&mut self, scope: Scope, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut ActionCx<'_>) -> anyhow::Result<ActionOutcome> + 'static,
    {
        self.dispatcher.registry_mut(scope).register(name, handler);
    }

    /// Handle one key press; returns true if the key was consumed
    ///
    /// When this returns false the caller should deliver the key as ordinary
    /// input.
    pub fn dispatch_possible_special_key(&mut self, ev: &KeyEvent, host: &mut dyn Host) -> bool {
        let active = self.active();
        let selected = {
            let keymap = self
                .stack
                .top()
                .map_or(&self.root.keymap, |top| top.state.keymap());
            select(resolve_candidates(keymap, ev))
        };

        let Some(first) = selected.first() else {
            return self.dispatch_unmatched(ev, active, host);
        };

        if !first.is_sequence {
            tracing::debug!(target: "keyboard", key = %ev, action = %first.definition, "key matched");
            let outcome = self.run_definition(&first.definition, host);
            match active {
                // A failed action leaves a one-shot mode in place
                Active::Static {
                    instance,
                    on_action: OnAction::End,
                    ..
                } if outcome == Dispatched::Consumed => {
                    self.stack.remove_instance(instance, host);
                }
                Active::Sequence { instance } if outcome.consumed() => {
                    self.stack.remove_instance(instance, host);
                }
                _ => {}
            }
            return outcome.consumed();
        }

        match active {
            Active::Sequence { .. } => {
                if let [only] = selected.as_slice() {
                    if only.is_terminal() {
                        tracing::debug!(target: "keyboard", key = %ev, action = %only.definition, "sequence completed");
                        let mut buffered_keys = chord_keys(self.stack.pop(host));
                        if !self.combine(&only.definition, host) {
                            buffered_keys.push(*ev);
                            host.send_key_sequence(&buffered_keys);
                        }
                        return true;
                    }
                }
                tracing::debug!(target: "keyboard", key = %ev, "sequence advanced");
                self.stack.advance_sequence(*ev, continuations(&selected));
            }
            Active::Root | Active::Static { .. } => {
                tracing::debug!(target: "keyboard", key = %ev, candidates = selected.len(), "matched sequence prefix");
                self.stack.push(
                    ModeState::SequenceInProgress {
                        buffered_keys: vec![*ev],
                        continuations: continuations(&selected),
                    },
                    host,
                );
            }
        }
        true
    }

    fn dispatch_unmatched(&mut self, ev: &KeyEvent, active: Active, host: &mut dyn Host) -> bool {
        if ev.is_modifier_key() {
            return false;
        }

        if let Some(global) = select(resolve_candidates(&self.global_map, ev)).pop() {
            tracing::debug!(target: "keyboard", key = %ev, action = %global.definition, "global shortcut matched");
            self.combine(&global.definition, host);
            return true;
        }

        match active {
            Active::Root => false,
            Active::Sequence { .. } => {
                let buffered_keys = chord_keys(self.stack.pop(host));
                tracing::debug!(target: "keyboard", key = %ev, replayed = buffered_keys.len(), "sequence abandoned");
                host.send_key_sequence(&buffered_keys);
                false
            }
            Active::Static { on_unknown, .. } => match on_unknown {
                OnUnknown::Beep => {
                    host.beep();
                    true
                }
                OnUnknown::Ignore => true,
                OnUnknown::Passthrough => false,
                OnUnknown::End => {
                    self.stack.pop(host);
                    true
                }
            },
        }
    }

    fn active(&self) -> Active {
        let Some(top) = self.stack.top() else {
            return Active::Root;
        };
        match &top.state {
            ModeState::Static(mode) => Active::Static {
                instance: top.instance,
                on_unknown: mode.on_unknown,
                on_action: mode.on_action,
            },
            ModeState::SequenceInProgress { .. } => Active::Sequence {
                instance: top.instance,
            },
        }
    }

    /// Run an action definition against whatever is focused
    ///
    /// Queued continuations look the focus up again when they run, so each
    /// one sees the tab or window the previous action left active.
    pub fn combine(&mut self, definition: &str, host: &mut dyn Host) -> bool {
        self.run_definition(definition, host).consumed()
    }

    fn run_definition(&mut self, definition: &str, host: &mut dyn Host) -> Dispatched {
        let mut env = DispatchEnv {
            stack: &mut self.stack,
            modes: &self.modes,
            host,
        };
        self.dispatcher.combine(definition, None, &mut env)
    }

    /// Run one queued continuation of an action chain
    ///
    /// Call once per event-loop iteration while [`Shortcuts::has_pending_actions`].
    pub fn tick(&mut self, host: &mut dyn Host) -> bool {
        let mut env = DispatchEnv {
            stack: &mut self.stack,
            modes: &self.modes,
            host,
        };
        self.dispatcher.tick(&mut env)
    }

    pub fn has_pending_actions(&self) -> bool {
        self.dispatcher.has_pending_actions()
    }

    pub fn push_keyboard_mode(&mut self, name: &str, host: &mut dyn Host) -> Result<(), ModeError> {
        self.stack.push_named(&self.modes, name, host)?;
        Ok(())
    }

    /// Pop the top mode; false if only root was active
    pub fn pop_keyboard_mode(&mut self, host: &mut dyn Host) -> bool {
        self.stack.pop(host).is_some()
    }

    pub fn clear_keyboard_modes(&mut self, host: &mut dyn Host) {
        self.stack.clear(host);
    }

    /// Number of modes above root, including a chord in progress
    pub fn mode_depth(&self) -> usize {
        self.stack.len()
    }

    /// Name of the active mode; empty for root
    pub fn active_mode_name(&self) -> &str {
        self.stack.top().map_or("", |top| top.state.name())
    }

    /// Keys typed so far in an unfinished chord, e.g. "ctrl+x ctrl+a"
    pub fn pending_sequence_display(&self) -> Option<String> {
        match &self.stack.top()?.state {
            ModeState::SequenceInProgress { buffered_keys, .. } => Some(
                buffered_keys
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            ModeState::Static(_) => None,
        }
    }

    pub fn root_keymap(&self) -> &KeyMap {
        &self.root.keymap
    }

    pub fn keyboard_modes(&self) -> &IndexMap<String, Rc<KeyboardMode>> {
        &self.modes
    }

    /// Action name to key for every global shortcut
    pub fn global_shortcuts(&self) -> &IndexMap<String, SingleKey> {
        &self.global_shortcuts
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Keys typed so far in a chord frame taken off the stack
fn chord_keys(frame: Option<StackedMode>) -> Vec<KeyEvent> {
    match frame.map(|f| f.state) {
        Some(ModeState::SequenceInProgress { buffered_keys, .. }) => buffered_keys,
        _ => Vec::new(),
    }
}

/// Keymap of the next chord step for each continuing candidate
fn continuations(selected: &[KeyDefinition]) -> KeyMap {
    KeyMap::with_definitions(
        selected
            .iter()
            .filter(|d| !d.is_terminal())
            .map(KeyDefinition::shift_sequence_and_copy),
    )
}
