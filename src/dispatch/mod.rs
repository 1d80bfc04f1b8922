//! Action dispatch
//!
//! ```text
//! definition → AliasMap::resolve() → [Action] → application / tab / window scope
//! ```
//!
//! The first action of a chain runs inline; the remainder waits in a queue
//! drained one action per event-loop tick.

mod action;
mod dispatcher;
mod scope;

pub use action::{tokenize, Action, AliasExpansionError, AliasMap, COMBINE};
pub use dispatcher::{DispatchEnv, Dispatched, Dispatcher, PendingAction};
pub use scope::{ActionCx, ActionHandler, ActionOutcome, CapabilityRegistry, Scope};
