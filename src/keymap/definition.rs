//! KeyDefinition: one configured binding from a key (or key sequence) to an action

use super::types::SingleKey;

/// A single configured binding
///
/// Definitions are immutable; advancing through a sequence produces a
/// shifted copy via [`KeyDefinition::shift_sequence_and_copy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    /// Action text: an action name followed by its arguments
    pub definition: String,
    /// Whether this binding belongs to a multi-key sequence
    pub is_sequence: bool,
    /// The key this definition is stored under
    pub trigger: SingleKey,
    /// Keys still to be pressed after `trigger`
    pub rest: Vec<SingleKey>,
    /// Focus context this binding is restricted to
    pub when_focus_on: Option<String>,
}

impl KeyDefinition {
    /// Create a single-key binding
    pub fn new(trigger: SingleKey, definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            is_sequence: false,
            trigger,
            rest: Vec::new(),
            when_focus_on: None,
        }
    }

    /// Create a binding from a key sequence
    ///
    /// A single key produces an ordinary binding. Returns `None` for an
    /// empty sequence.
    pub fn sequence(keys: &[SingleKey], definition: impl Into<String>) -> Option<Self> {
        let (trigger, rest) = keys.split_first()?;
        Some(Self {
            definition: definition.into(),
            is_sequence: !rest.is_empty(),
            trigger: *trigger,
            rest: rest.to_vec(),
            when_focus_on: None,
        })
    }

    /// Restrict this binding to a focus context (builder pattern)
    pub fn when_focus_on(mut self, context: impl Into<String>) -> Self {
        self.when_focus_on = Some(context.into());
        self
    }

    /// True if no keys remain after the trigger
    pub fn is_terminal(&self) -> bool {
        self.rest.is_empty()
    }

    /// The full key sequence, trigger first
    pub fn keys(&self) -> Vec<SingleKey> {
        std::iter::once(self.trigger)
            .chain(self.rest.iter().copied())
            .collect()
    }

    /// Copy of this definition advanced by one key
    ///
    /// The copy is triggered by the next key of the sequence. Calling this on
    /// a terminal definition returns an unchanged copy.
    pub fn shift_sequence_and_copy(&self) -> Self {
        let mut copy = self.clone();
        if let Some((next, rest)) = self.rest.split_first() {
            copy.trigger = *next;
            copy.rest = rest.to_vec();
        }
        copy
    }

    /// Single key, not part of a sequence and not focus-restricted
    pub fn is_suitable_for_global_shortcut(&self) -> bool {
        !self.is_sequence && self.when_focus_on.is_none()
    }

    /// Get display string for this binding's keys
    pub fn display_string(&self) -> String {
        self.keys()
            .iter()
            .map(|k| k.display_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
