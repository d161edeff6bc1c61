use std::io::Read;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grammar::code::{CodeGroup, EventCode};
use crate::grammar::StateId;
use crate::io::BitReader;
use crate::types::{Event, EventKind, QName, Value, ValueDomain};

/// Names an event type accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum NamePattern {
    /// Exactly this name; known to both sides, so nothing is written for it.
    Exact(QName),
    /// Any local name within the namespace; the local name is written.
    Namespace(String),
    /// Any name; namespace and local name are written.
    Any,
    /// Items without a name.
    Anonymous,
}

impl NamePattern {
    /// Pattern matching exactly `name`.
    pub fn exact(name: impl Into<QName>) -> Self {
        Self::Exact(name.into())
    }

    /// Whether an event named `name` fits; `None` is an anonymous item.
    pub fn matches(&self, name: Option<&QName>) -> bool {
        match (self, name) {
            (Self::Anonymous, None) => true,
            (Self::Exact(expected), Some(name)) => expected == name,
            (Self::Namespace(uri), Some(name)) => *uri == name.namespace,
            (Self::Any, Some(_)) => true,
            _ => false,
        }
    }

    /// Returns `true` when the matched name must be written to the stream.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Namespace(_) | Self::Any)
    }

    /// Lower is more specific; exact names win over namespace wildcards, which win
    /// over `Any`.
    fn rank(&self) -> u8 {
        match self {
            Self::Exact(_) | Self::Anonymous => 0,
            Self::Namespace(_) => 1,
            Self::Any => 2,
        }
    }
}

/// Where the cursor goes after an event type is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Continue in the given state.
    Next(StateId),
    /// Enter a container.
    Descend {
        /// State the container content starts in.
        content: StateId,
        /// State the enclosing level resumes in once the container ends.
        next: StateId,
    },
    /// Leave the current container.
    Ascend,
    /// The stream ends.
    Finish,
}

/// A production of a grammar state together with its event code.
#[derive(Debug, Clone)]
pub struct EventType {
    pub(crate) kind: EventKind,
    pub(crate) pattern: NamePattern,
    pub(crate) domain: Option<ValueDomain>,
    pub(crate) target: Target,
    pub(crate) tier: u8,
    pub(crate) code: EventCode,
}

impl EventType {
    /// Item kind the event type accepts.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Names the event type accepts.
    pub fn pattern(&self) -> &NamePattern {
        &self.pattern
    }

    /// Value domain of value event types.
    pub fn domain(&self) -> Option<ValueDomain> {
        self.domain
    }

    /// Where the cursor goes after the event.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Code tier, 0 to 2.
    pub fn tier(&self) -> u8 {
        self.tier
    }

    /// Code written for the event type.
    pub fn code(&self) -> &EventCode {
        &self.code
    }
}

/// Result of matching an event against a state.
#[derive(Debug, Clone)]
pub struct Matched {
    /// Index into [`GrammarState::event_types`].
    pub index: usize,
    /// The event's value coerced into the event type's domain.
    pub value: Option<Value>,
}

/// One state of a grammar: its ordered event types and their code tree.
#[derive(Debug, Clone)]
pub struct GrammarState {
    pub(crate) label: String,
    pub(crate) event_types: Vec<EventType>,
    pub(crate) codes: CodeGroup,
}

impl GrammarState {
    /// Label given when the state was declared.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Event types in production order.
    pub fn event_types(&self) -> &[EventType] {
        &self.event_types
    }

    /// Finds the event type that should carry `event`.
    ///
    /// Candidates must have the event's kind and a pattern accepting its name. The
    /// most specific pattern wins, list order breaking ties. A value event also
    /// needs a domain that accepts its value; candidates that do not are skipped,
    /// and if nothing else matches the domain failure is reported.
    pub fn match_event(&self, event: &Event) -> Result<Matched> {
        let kind = event.kind();
        let name = event.name();
        let mut best: Option<(u8, usize, Option<Value>)> = None;
        let mut domain_error = None;

        for (index, event_type) in self.event_types.iter().enumerate() {
            if event_type.kind != kind || !event_type.pattern.matches(name) {
                continue;
            }
            let rank = event_type.pattern.rank();
            if best.as_ref().is_some_and(|(best_rank, ..)| *best_rank <= rank) {
                continue;
            }
            let value = match (event_type.domain, event) {
                (Some(domain), Event::Value { value, .. }) => match domain.coerce(value) {
                    Ok(coerced) => Some(coerced),
                    Err(err) => {
                        domain_error.get_or_insert(err);
                        continue;
                    }
                },
                _ => None,
            };
            best = Some((rank, index, value));
            if rank == 0 {
                break;
            }
        }

        match best {
            Some((_, index, value)) => Ok(Matched { index, value }),
            None => Err(domain_error.unwrap_or_else(|| Error::GrammarMismatch {
                state: self.label.clone(),
                event: event.to_string(),
            })),
        }
    }

    /// Reads an event code and returns the event type it selects.
    pub fn read_code<R: Read>(&self, reader: &mut BitReader<R>) -> Result<&EventType> {
        let index = self
            .codes
            .read(reader)
            .map_err(|err| match err {
                Error::InvalidData(msg) => {
                    Error::invalid(format!("state `{}`: {msg}", self.label))
                }
                other => other,
            })?;
        Ok(&self.event_types[index])
    }
}
