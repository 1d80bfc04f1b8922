//! Keyboard modes and the mode stack
//!
//! The root mode is never on the stack; an empty stack means root is active.
//! Sequence modes are synthesized while a chord is being entered and are
//! rebuilt, never edited, each time the chord advances.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::keymap::KeyMap;
use super::types::KeyEvent;
use crate::host::Host;

/// What a mode does with a key it has no binding for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnUnknown {
    /// Swallow the key and ring the bell
    #[default]
    Beep,
    /// Swallow the key silently
    Ignore,
    /// Deliver the key to the focused surface
    Passthrough,
    /// Leave the mode and swallow the key
    End,
}

/// What a mode does after one of its actions is dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnAction {
    /// Stay in the mode
    #[default]
    Keep,
    /// Leave the mode (one-shot)
    End,
}

/// A named, configured keyboard mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardMode {
    pub name: String,
    pub keymap: KeyMap,
    pub on_unknown: OnUnknown,
    pub on_action: OnAction,
}

impl KeyboardMode {
    /// The always-present root mode
    pub fn root(keymap: KeyMap) -> Self {
        Self {
            name: String::new(),
            keymap,
            on_unknown: OnUnknown::Passthrough,
            on_action: OnAction::Keep,
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }
}

/// State of one entry on the mode stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeState {
    /// A configured mode pushed by name
    Static(Rc<KeyboardMode>),
    /// A chord in progress: the keys typed so far and the possible continuations
    SequenceInProgress {
        buffered_keys: Vec<KeyEvent>,
        continuations: KeyMap,
    },
}

impl ModeState {
    pub fn keymap(&self) -> &KeyMap {
        match self {
            ModeState::Static(mode) => &mode.keymap,
            ModeState::SequenceInProgress { continuations, .. } => continuations,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ModeState::Static(mode) => &mode.name,
            ModeState::SequenceInProgress { .. } => "__sequence__",
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, ModeState::SequenceInProgress { .. })
    }
}

/// Identifies one push of a mode, distinct from every other push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeInstance(u64);

/// A mode on the stack together with its instance id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedMode {
    pub instance: ModeInstance,
    pub state: ModeState,
}

/// Errors from mode stack operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("no keyboard mode named {0:?}")]
    UnknownMode(String),
}

/// Modes layered above root, most recent last
///
/// The host is told to bypass OS keyboard processing while the stack is
/// non-empty.
#[derive(Debug, Default)]
pub struct ModeStack {
    frames: Vec<StackedMode>,
    next_instance: u64,
}

impl ModeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a mode, returning the id of this push
    pub fn push(&mut self, state: ModeState, host: &mut dyn Host) -> ModeInstance {
        let instance = ModeInstance(self.next_instance);
        self.next_instance += 1;
        tracing::debug!(target: "keyboard", mode = state.name(), depth = self.frames.len() + 1, "pushed keyboard mode");
        self.frames.push(StackedMode { instance, state });
        host.set_ignore_os_keyboard_processing(true);
        instance
    }

    /// Push a configured mode by name
    pub fn push_named(
        &mut self,
        modes: &IndexMap<String, Rc<KeyboardMode>>,
        name: &str,
        host: &mut dyn Host,
    ) -> Result<ModeInstance, ModeError> {
        let mode = modes
            .get(name)
            .ok_or_else(|| ModeError::UnknownMode(name.to_string()))?;
        Ok(self.push(ModeState::Static(Rc::clone(mode)), host))
    }

    /// Pop the top mode
    pub fn pop(&mut self, host: &mut dyn Host) -> Option<StackedMode> {
        let popped = self.frames.pop()?;
        tracing::debug!(target: "keyboard", mode = popped.state.name(), depth = self.frames.len(), "popped keyboard mode");
        if self.frames.is_empty() {
            host.set_ignore_os_keyboard_processing(false);
        }
        Some(popped)
    }

    /// Remove a specific push wherever it sits in the stack
    pub fn remove_instance(&mut self, instance: ModeInstance, host: &mut dyn Host) -> bool {
        let Some(pos) = self.frames.iter().position(|f| f.instance == instance) else {
            return false;
        };
        let removed = self.frames.remove(pos);
        tracing::debug!(target: "keyboard", mode = removed.state.name(), depth = self.frames.len(), "ended keyboard mode");
        if self.frames.is_empty() {
            host.set_ignore_os_keyboard_processing(false);
        }
        true
    }

    /// Extend the chord on top of the stack by one key
    ///
    /// The frame keeps its instance id; its state is rebuilt with the new
    /// continuations. Returns false if the top frame is not a chord.
    pub fn advance_sequence(&mut self, key: KeyEvent, continuations: KeyMap) -> bool {
        let Some(top) = self.frames.last_mut() else {
            return false;
        };
        let ModeState::SequenceInProgress { buffered_keys, .. } = &mut top.state else {
            return false;
        };
        let mut buffered_keys = std::mem::take(buffered_keys);
        buffered_keys.push(key);
        top.state = ModeState::SequenceInProgress {
            buffered_keys,
            continuations,
        };
        true
    }

    pub fn clear(&mut self, host: &mut dyn Host) {
        self.frames.clear();
        host.set_ignore_os_keyboard_processing(false);
    }

    pub fn top(&self) -> Option<&StackedMode> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackedMode> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn static_mode(name: &str) -> ModeState {
        ModeState::Static(Rc::new(KeyboardMode::new(name)))
    }

    #[test]
    fn test_root_mode_defaults() {
        let root = KeyboardMode::root(KeyMap::new());
        assert!(root.is_root());
        assert_eq!(root.on_unknown, OnUnknown::Passthrough);
    }

    #[test]
    fn test_named_mode_defaults() {
        let mode = KeyboardMode::new("resize");
        assert!(!mode.is_root());
        assert_eq!(mode.on_unknown, OnUnknown::Beep);
        assert_eq!(mode.on_action, OnAction::Keep);
    }

    #[test]
    fn test_push_pop() {
        let mut host = NullHost;
        let mut stack = ModeStack::new();
        assert!(stack.is_empty());

        stack.push(static_mode("a"), &mut host);
        stack.push(static_mode("b"), &mut host);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().unwrap().state.name(), "b");

        let popped = stack.pop(&mut host).unwrap();
        assert_eq!(popped.state.name(), "b");
        assert_eq!(stack.len(), 1);
        assert!(stack.pop(&mut host).is_some());
        assert!(stack.pop(&mut host).is_none());
    }

    #[test]
    fn test_instances_are_distinct() {
        let mut host = NullHost;
        let mut stack = ModeStack::new();
        let first = stack.push(static_mode("a"), &mut host);
        let second = stack.push(static_mode("a"), &mut host);
        assert_ne!(first, second);

        assert!(stack.remove_instance(first, &mut host));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().unwrap().instance, second);
        assert!(!stack.remove_instance(first, &mut host));
    }

    #[test]
    fn test_push_named() {
        let mut host = NullHost;
        let mut stack = ModeStack::new();
        let mut modes = IndexMap::new();
        modes.insert("resize".to_string(), Rc::new(KeyboardMode::new("resize")));

        stack.push_named(&modes, "resize", &mut host).unwrap();
        assert_eq!(stack.top().unwrap().state.name(), "resize");
        assert_eq!(
            stack.push_named(&modes, "missing", &mut host),
            Err(ModeError::UnknownMode("missing".into()))
        );
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_advance_sequence_keeps_instance() {
        let mut host = NullHost;
        let mut stack = ModeStack::new();
        let x = KeyEvent::char('x', Default::default());
        let id = stack.push(
            ModeState::SequenceInProgress {
                buffered_keys: vec![x],
                continuations: KeyMap::new(),
            },
            &mut host,
        );

        assert!(stack.advance_sequence(KeyEvent::char('y', Default::default()), KeyMap::new()));
        let top = stack.top().unwrap();
        assert_eq!(top.instance, id);
        match &top.state {
            ModeState::SequenceInProgress { buffered_keys, .. } => {
                assert_eq!(buffered_keys.len(), 2);
                assert_eq!(buffered_keys[0], x);
            }
            other => panic!("expected a chord, got {:?}", other),
        }
    }

    #[test]
    fn test_advance_sequence_needs_a_chord_on_top() {
        let mut host = NullHost;
        let mut stack = ModeStack::new();
        assert!(!stack.advance_sequence(KeyEvent::char('x', Default::default()), KeyMap::new()));

        stack.push(static_mode("resize"), &mut host);
        assert!(!stack.advance_sequence(KeyEvent::char('x', Default::default()), KeyMap::new()));
        assert_eq!(stack.top().unwrap().state.name(), "resize");
    }
}
