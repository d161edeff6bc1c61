//! Grammars: finite state machines whose states list the event types permitted
//! next.
//!
//! A [`Grammar`] is immutable once built and can be shared between any number of
//! concurrent sessions; each session walks it with its own [`GrammarCursor`].

mod builder;
mod code;
mod cursor;
mod definition;
mod presets;
mod state;

pub use builder::{GrammarBuilder, MAX_BOUNDED_WIDTH, Production};
pub use code::{CodeLayout, CodePart, EventCode, MAX_TIERS};
pub use cursor::GrammarCursor;
pub use definition::{GrammarDefinition, ProductionDefinition, StateDefinition};
pub use state::{EventType, GrammarState, Matched, NamePattern, Target};

use crate::table::NameTable;

/// Index of a state within its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) u32);

impl StateId {
    /// Position of the state in [`Grammar::states`].
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Compiled grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    states: Vec<GrammarState>,
    initial: StateId,
}

impl Grammar {
    /// Starts a [`GrammarBuilder`].
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// State a stream starts in.
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// State `id`; ids come from this grammar's builder.
    pub fn state(&self, id: StateId) -> &GrammarState {
        &self.states[id.index()]
    }

    /// All states in declaration order.
    pub fn states(&self) -> &[GrammarState] {
        &self.states
    }

    /// State with `label`, if any.
    pub fn lookup(&self, label: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.label() == label)
            .map(|idx| StateId(idx as u32))
    }

    /// Interns every name and namespace the grammar mentions, in grammar order, so
    /// both sides of a stream start from the same tables.
    pub(crate) fn preload(&self, names: &mut NameTable) {
        for state in &self.states {
            for event_type in state.event_types() {
                match event_type.pattern() {
                    NamePattern::Exact(name) => {
                        names.intern(name);
                    }
                    NamePattern::Namespace(uri) => {
                        names.intern_namespace(uri);
                    }
                    NamePattern::Any | NamePattern::Anonymous => {}
                }
            }
        }
    }
}
