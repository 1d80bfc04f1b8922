//! KeyMap storage plus candidate lookup and selection
//!
//! Lookup (`resolve_candidates`) turns a key event into the definitions stored
//! for it; selection (`select`) picks the definitions that actually apply.

use indexmap::IndexMap;

use super::definition::KeyDefinition;
use super::types::{KeyEvent, Modifiers, SingleKey};

/// Ordered mapping from key identity to the definitions bound to it
///
/// Within one entry, later definitions were configured more recently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMap {
    entries: IndexMap<SingleKey, Vec<KeyDefinition>>,
}

impl KeyMap {
    /// Create an empty keymap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a keymap with the given definitions, in order
    pub fn with_definitions(definitions: impl IntoIterator<Item = KeyDefinition>) -> Self {
        let mut keymap = Self::new();
        for definition in definitions {
            keymap.add(definition);
        }
        keymap
    }

    /// Append a definition under its trigger key
    pub fn add(&mut self, definition: KeyDefinition) {
        self.entries
            .entry(definition.trigger)
            .or_default()
            .push(definition);
    }

    /// Definitions stored for a key, oldest first
    pub fn get(&self, key: &SingleKey) -> Option<&[KeyDefinition]> {
        self.entries
            .get(key)
            .map(Vec::as_slice)
            .filter(|defs| !defs.is_empty())
    }

    /// Remove every definition stored for a key
    pub fn remove(&mut self, key: &SingleKey) -> Option<Vec<KeyDefinition>> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &SingleKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of distinct trigger keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over trigger keys and their definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&SingleKey, &[KeyDefinition])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterate over every definition
    pub fn definitions(&self) -> impl Iterator<Item = &KeyDefinition> {
        self.entries.values().flatten()
    }

    /// Get the most recent definition whose action text matches
    pub fn binding_for(&self, definition: &str) -> Option<&KeyDefinition> {
        self.definitions()
            .filter(|d| d.definition == definition)
            .last()
    }

    /// Get display string for an action's binding
    pub fn display_for(&self, definition: &str) -> Option<String> {
        self.binding_for(definition).map(|d| d.display_string())
    }
}

/// Look up the definitions for a key event
///
/// Tries, in order, the exact key with masked modifiers, the shifted glyph
/// without shift, then the native platform code. The first hit wins; an empty
/// slice means no binding at any step.
pub fn resolve_candidates<'a>(keymap: &'a KeyMap, ev: &KeyEvent) -> &'a [KeyDefinition] {
    let mods = ev.mods.masked();

    keymap
        .get(&SingleKey::new(ev.key, mods))
        .or_else(|| {
            let shifted = ev.shifted_key?;
            if !mods.shift() {
                return None;
            }
            keymap.get(&SingleKey::new(shifted, mods.difference(Modifiers::SHIFT)))
        })
        .or_else(|| keymap.get(&SingleKey::native(ev.native_key, mods)))
        .unwrap_or(&[])
}

/// Pick the applicable definitions among the candidates for one key
///
/// Without any sequence definitions, the most recent candidate shadows the
/// rest. With sequences, the most recent terminal candidate wins if it is
/// the last one; otherwise only the candidates configured after it remain.
/// A terminal followed by longer sequences is dropped rather than kept
/// alongside them, since the chord frame pushed for the sequences would
/// otherwise hold a zero-length continuation that fires on the next key.
/// The survivors are then restricted to the focus context of the last one.
pub fn select(candidates: &[KeyDefinition]) -> Vec<KeyDefinition> {
    let Some(last) = candidates.last() else {
        return Vec::new();
    };

    if !candidates.iter().any(|c| c.is_sequence) {
        return vec![last.clone()];
    }

    let retained = match candidates.iter().rposition(KeyDefinition::is_terminal) {
        Some(idx) if idx == candidates.len() - 1 => &candidates[idx..],
        Some(idx) => &candidates[idx + 1..],
        None => candidates,
    };

    let Some(context) = retained.last().map(|d| d.when_focus_on.as_deref()) else {
        return Vec::new();
    };
    retained
        .iter()
        .filter(|d| d.when_focus_on.as_deref() == context)
        .cloned()
        .collect()
}
