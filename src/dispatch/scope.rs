//! Capability scopes: where action names are looked up
//!
//! Each scope is a plain name → handler map built at startup. Lookup order
//! is application, then the active tab, then the active window.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::action::Action;
use crate::host::{FocusTarget, Host};
use crate::keymap::{KeyboardMode, ModeError, ModeStack};

/// The three places an action can be implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Application,
    Tab,
    Window,
}

impl Scope {
    /// Lookup order
    pub const ALL: [Scope; 3] = [Scope::Application, Scope::Tab, Scope::Window];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Application => "application",
            Scope::Tab => "tab",
            Scope::Window => "window",
        };
        f.write_str(name)
    }
}

/// Result of running a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action handled the key
    Consumed,
    /// The handler chose not to act; the key passes through and no later
    /// scope is tried
    Declined,
}

/// Handler signature shared by every scope
pub type ActionHandler = Box<dyn Fn(&mut ActionCx<'_>) -> anyhow::Result<ActionOutcome>>;

/// State a handler gets to work with
pub struct ActionCx<'a> {
    pub action: &'a Action,
    pub scope: Scope,
    /// Tab/window the action targets; `None` for application actions run
    /// without an active window
    pub focus: Option<FocusTarget>,
    pub stack: &'a mut ModeStack,
    pub modes: &'a IndexMap<String, Rc<KeyboardMode>>,
    pub host: &'a mut dyn Host,
}

impl<'a> ActionCx<'a> {
    pub fn args(&self) -> &'a [String] {
        &self.action.args
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.action.args.get(index).map(String::as_str)
    }

    pub fn push_keyboard_mode(&mut self, name: &str) -> Result<(), ModeError> {
        self.stack.push_named(self.modes, name, &mut *self.host)?;
        Ok(())
    }

    /// Pop the top mode; false if only root was active
    pub fn pop_keyboard_mode(&mut self) -> bool {
        self.stack.pop(&mut *self.host).is_some()
    }
}

/// Name → handler map for one scope
pub struct CapabilityRegistry {
    scope: Scope,
    handlers: HashMap<String, ActionHandler>,
}

impl CapabilityRegistry {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            handlers: HashMap::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Install a handler, replacing any earlier one for the same name
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut ActionCx<'_>) -> anyhow::Result<ActionOutcome> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&ActionHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CapabilityRegistry")
            .field("scope", &self.scope)
            .field("actions", &names)
            .finish()
    }
}
