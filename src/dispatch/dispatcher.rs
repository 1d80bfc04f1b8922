//! Action dispatch: scope resolution, chaining and error containment

use std::collections::VecDeque;
use std::rc::Rc;

use anyhow::anyhow;
use indexmap::IndexMap;

use super::action::{Action, AliasMap};
use super::scope::{ActionCx, ActionHandler, ActionOutcome, CapabilityRegistry, Scope};
use crate::host::{FocusTarget, Host};
use crate::keymap::{KeyboardMode, ModeStack};

/// Mutable engine state an action may touch
pub struct DispatchEnv<'a> {
    pub stack: &'a mut ModeStack,
    pub modes: &'a IndexMap<String, Rc<KeyboardMode>>,
    pub host: &'a mut dyn Host,
}

/// An action waiting for its turn on the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub action: Action,
    /// Focus at the time the chain started; `None` is re-resolved when run
    pub focus: Option<FocusTarget>,
}

/// How an action definition was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A handler took the action
    Consumed,
    /// Nothing handled it; the key passes through
    Passed,
    /// Expansion or the handler failed and the error was reported
    Failed,
}

impl Dispatched {
    /// Whether the key that triggered the definition is used up
    ///
    /// A reported failure still consumes the key.
    pub fn consumed(self) -> bool {
        self != Dispatched::Passed
    }
}

/// Resolves action definitions against the three scopes
///
/// The first action of a chain runs immediately. The rest are queued and
/// run one per [`Dispatcher::tick`].
#[derive(Debug)]
pub struct Dispatcher {
    application: CapabilityRegistry,
    tab: CapabilityRegistry,
    window: CapabilityRegistry,
    aliases: AliasMap,
    pending: VecDeque<PendingAction>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher with the built-in mode actions in the application scope
    pub fn new() -> Self {
        let mut application = CapabilityRegistry::new(Scope::Application);
        application.register("push_keyboard_mode", push_keyboard_mode);
        application.register("pop_keyboard_mode", pop_keyboard_mode);

        Self {
            application,
            tab: CapabilityRegistry::new(Scope::Tab),
            window: CapabilityRegistry::new(Scope::Window),
            aliases: AliasMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn registry(&self, scope: Scope) -> &CapabilityRegistry {
        match scope {
            Scope::Application => &self.application,
            Scope::Tab => &self.tab,
            Scope::Window => &self.window,
        }
    }

    pub fn registry_mut(&mut self, scope: Scope) -> &mut CapabilityRegistry {
        match scope {
            Scope::Application => &mut self.application,
            Scope::Tab => &mut self.tab,
            Scope::Window => &mut self.window,
        }
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn set_aliases(&mut self, aliases: AliasMap) {
        self.aliases = aliases;
    }

    pub fn has_pending_actions(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_actions(&self) -> impl Iterator<Item = &PendingAction> {
        self.pending.iter()
    }

    /// Run an action definition
    ///
    /// Expansion errors and handler errors are reported through the host.
    /// When the first action is consumed, the rest of the chain is queued for
    /// later ticks with the same `focus`; `None` makes every queued action
    /// target whatever is active when it runs.
    pub fn combine(
        &mut self,
        definition: &str,
        focus: Option<FocusTarget>,
        env: &mut DispatchEnv<'_>,
    ) -> Dispatched {
        if definition.trim().is_empty() {
            return Dispatched::Passed;
        }

        let actions = match self.aliases.resolve(definition) {
            Ok(actions) => actions,
            Err(e) => {
                tracing::warn!(target: "keyboard", definition, error = %e, "failed to parse action");
                env.host
                    .show_error("Failed to parse action", &format!("{}\n{}", definition, e));
                return Dispatched::Failed;
            }
        };

        let mut actions = actions.into_iter();
        let Some(first) = actions.next() else {
            return Dispatched::Passed;
        };

        match self.dispatch_action(&first, focus, env) {
            Ok(true) => {
                self.pending
                    .extend(actions.map(|action| PendingAction { action, focus }));
                Dispatched::Consumed
            }
            Ok(false) => Dispatched::Passed,
            Err(e) => {
                report_failure(&first, &e, env.host);
                Dispatched::Failed
            }
        }
    }

    /// Run the next queued action, if any
    ///
    /// Returns true if an action was taken off the queue.
    pub fn tick(&mut self, env: &mut DispatchEnv<'_>) -> bool {
        let Some(PendingAction { action, focus }) = self.pending.pop_front() else {
            return false;
        };
        if let Err(e) = self.dispatch_action(&action, focus, env) {
            report_failure(&action, &e, env.host);
        }
        true
    }

    /// Drop every queued action
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Resolve one elementary action against the scopes in order
    ///
    /// Returns whether it was consumed. An unknown name is not an error.
    pub fn dispatch_action(
        &self,
        action: &Action,
        focus: Option<FocusTarget>,
        env: &mut DispatchEnv<'_>,
    ) -> anyhow::Result<bool> {
        if let Some(handler) = self.application.get(&action.name) {
            return run(handler, action, Scope::Application, focus, env);
        }

        // Tab and window actions need an active window
        let Some(focus) = focus.or_else(|| env.host.active_focus()) else {
            tracing::debug!(target: "keyboard", action = %action, "no active window for action");
            return Ok(false);
        };
        for registry in [&self.tab, &self.window] {
            if let Some(handler) = registry.get(&action.name) {
                return run(handler, action, registry.scope(), Some(focus), env);
            }
        }

        tracing::debug!(target: "keyboard", action = %action, "no scope handles action");
        Ok(false)
    }
}

fn run(
    handler: &ActionHandler,
    action: &Action,
    scope: Scope,
    focus: Option<FocusTarget>,
    env: &mut DispatchEnv<'_>,
) -> anyhow::Result<bool> {
    tracing::debug!(target: "keyboard", action = %action, %scope, "matched action");
    let mut cx = ActionCx {
        action,
        scope,
        focus,
        stack: &mut *env.stack,
        modes: env.modes,
        host: &mut *env.host,
    };
    let outcome = handler(&mut cx)?;
    if outcome == ActionOutcome::Declined {
        tracing::debug!(target: "keyboard", action = %action, %scope, "action declined");
    }
    Ok(outcome == ActionOutcome::Consumed)
}

fn report_failure(action: &Action, error: &anyhow::Error, host: &mut dyn Host) {
    tracing::warn!(target: "keyboard", action = %action, error = %error, "key action failed");
    host.show_error("Key action failed", &format!("{}\n{:#}", action.pretty(), error));
}

fn push_keyboard_mode(cx: &mut ActionCx<'_>) -> anyhow::Result<ActionOutcome> {
    let name = cx
        .arg(0)
        .ok_or_else(|| anyhow!("push_keyboard_mode needs a mode name"))?;
    cx.push_keyboard_mode(name)?;
    Ok(ActionOutcome::Consumed)
}

fn pop_keyboard_mode(cx: &mut ActionCx<'_>) -> anyhow::Result<ActionOutcome> {
    if cx.pop_keyboard_mode() {
        Ok(ActionOutcome::Consumed)
    } else {
        Ok(ActionOutcome::Declined)
    }
}
