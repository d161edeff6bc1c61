use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::grammar::code::{CodeGroup, CodeLayout, EventCode, MAX_TIERS};
use crate::grammar::{EventType, Grammar, GrammarState, NamePattern, StateId, Target};
use crate::types::{EventKind, ValueDomain};

/// Widest n-bit field a bounded integer may occupy.
pub const MAX_BOUNDED_WIDTH: u8 = 32;

/// A production before codes are assigned.
#[derive(Debug, Clone)]
pub struct Production {
    kind: EventKind,
    pattern: NamePattern,
    domain: Option<ValueDomain>,
    target: Target,
    tier: u8,
}

impl Production {
    /// Start of the document, moving to `next`.
    pub fn start_document(next: StateId) -> Self {
        Self::unnamed(EventKind::StartDocument, Target::Next(next))
    }

    /// End of the document; the stream is complete afterwards.
    pub fn end_document() -> Self {
        Self::unnamed(EventKind::EndDocument, Target::Finish)
    }

    /// Container start: its content is read in `content`, and the state after it
    /// ends is `next`.
    pub fn start_container(name: NamePattern, content: StateId, next: StateId) -> Self {
        Self {
            kind: EventKind::StartContainer,
            pattern: name,
            domain: None,
            target: Target::Descend { content, next },
            tier: 0,
        }
    }

    /// End of the innermost container, returning to the state saved at its start.
    pub fn end_container() -> Self {
        Self::unnamed(EventKind::EndContainer, Target::Ascend)
    }

    /// Value of `domain`, moving to `next`.
    pub fn value(name: NamePattern, domain: ValueDomain, next: StateId) -> Self {
        Self {
            kind: EventKind::Value,
            pattern: name,
            domain: Some(domain),
            target: Target::Next(next),
            tier: 0,
        }
    }

    /// Places the production in a nested code tier (0, 1 or 2).
    pub fn in_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    fn unnamed(kind: EventKind, target: Target) -> Self {
        Self {
            kind,
            pattern: NamePattern::Anonymous,
            domain: None,
            target,
            tier: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct StateDraft {
    label: String,
    layout: CodeLayout,
    productions: Vec<Production>,
}

/// Incremental constructor for [`Grammar`].
///
/// States are declared by label first so productions can refer to states defined
/// later (including cycles).
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    states: Vec<StateDraft>,
    by_label: HashMap<String, StateId>,
    initial: Option<StateId>,
}

impl GrammarBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a state, or returns the existing one with this label.
    pub fn state(&mut self, label: impl Into<String>) -> StateId {
        let label = label.into();
        if let Some(&id) = self.by_label.get(&label) {
            return id;
        }
        let id = StateId(self.states.len() as u32);
        self.states.push(StateDraft {
            label: label.clone(),
            layout: CodeLayout::default(),
            productions: Vec::new(),
        });
        self.by_label.insert(label, id);
        id
    }

    /// State declared with `label`, if any.
    pub fn lookup(&self, label: &str) -> Option<StateId> {
        self.by_label.get(label).copied()
    }

    /// Sets the state a stream starts in; defaults to the first declared state.
    pub fn initial(&mut self, state: StateId) -> &mut Self {
        self.initial = Some(state);
        self
    }

    /// Overrides how `state` numbers its event types.
    pub fn layout(&mut self, state: StateId, layout: CodeLayout) -> &mut Self {
        if let Some(draft) = self.states.get_mut(state.index()) {
            draft.layout = layout;
        }
        self
    }

    /// Appends a production to `state`; list order is match priority within a rank.
    pub fn production(&mut self, state: StateId, production: Production) -> &mut Self {
        if let Some(draft) = self.states.get_mut(state.index()) {
            draft.productions.push(production);
        }
        self
    }

    /// Validates the grammar and assigns event codes.
    pub fn build(&self) -> Result<Grammar> {
        let initial = match self.initial {
            Some(id) => id,
            None if !self.states.is_empty() => StateId(0),
            None => return Err(Error::grammar("grammar declares no states")),
        };
        let state_count = self.states.len();
        let check = |id: StateId, label: &str| {
            if id.index() < state_count {
                Ok(())
            } else {
                Err(Error::grammar(format!(
                    "state `{label}` refers to undeclared state #{}",
                    id.index()
                )))
            }
        };
        check(initial, "<initial>")?;

        let mut states = Vec::with_capacity(state_count);
        for draft in &self.states {
            if draft.productions.is_empty() {
                return Err(Error::grammar(format!(
                    "state `{}` has no productions",
                    draft.label
                )));
            }
            let mut tiers: Vec<Vec<usize>> = vec![Vec::new(); MAX_TIERS];
            let mut event_types = Vec::with_capacity(draft.productions.len());
            for (index, production) in draft.productions.iter().enumerate() {
                match production.target {
                    Target::Next(next) => check(next, &draft.label)?,
                    Target::Descend { content, next } => {
                        check(content, &draft.label)?;
                        check(next, &draft.label)?;
                    }
                    Target::Ascend | Target::Finish => {}
                }
                if let Some(ValueDomain::BoundedInteger { width, .. }) = production.domain {
                    if width > MAX_BOUNDED_WIDTH {
                        return Err(Error::grammar(format!(
                            "state `{}`: bounded integer width {width} exceeds {MAX_BOUNDED_WIDTH} bits",
                            draft.label
                        )));
                    }
                }
                let tier = tiers.get_mut(usize::from(production.tier)).ok_or_else(|| {
                    Error::grammar(format!(
                        "state `{}`: tier {} exceeds the {MAX_TIERS} supported tiers",
                        draft.label, production.tier
                    ))
                })?;
                tier.push(index);
                event_types.push(EventType {
                    kind: production.kind,
                    pattern: production.pattern.clone(),
                    domain: production.domain,
                    target: production.target,
                    tier: production.tier,
                    code: EventCode::default(),
                });
            }
            if tiers[0].is_empty() {
                return Err(Error::grammar(format!(
                    "state `{}` has no first-tier productions",
                    draft.label
                )));
            }

            let mut codes = vec![EventCode::default(); event_types.len()];
            let group = CodeGroup::build(&tiers, &draft.layout, 0, &EventCode::default(), &mut codes)
                .map_err(|err| Error::grammar(format!("state `{}`: {err}", draft.label)))?;
            for (event_type, code) in event_types.iter_mut().zip(codes) {
                event_type.code = code;
            }
            states.push(GrammarState {
                label: draft.label.clone(),
                event_types,
                codes: group,
            });
        }

        Ok(Grammar { states, initial })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_states_are_rejected() {
        let mut builder = GrammarBuilder::new();
        let doc = builder.state("Document");
        let content = builder.state("Content");
        builder.production(doc, Production::start_document(content));
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("`Content` has no productions"));
    }

    #[test]
    fn tiers_beyond_three_are_rejected() {
        let mut builder = GrammarBuilder::new();
        let doc = builder.state("Document");
        builder.production(doc, Production::end_document());
        builder.production(doc, Production::end_document().in_tier(3));
        assert!(matches!(builder.build(), Err(Error::Grammar(_))));
    }

    #[test]
    fn bounded_integers_wider_than_32_bits_are_rejected() {
        let mut builder = GrammarBuilder::new();
        let doc = builder.state("Document");
        let wide = ValueDomain::BoundedInteger { min: 0, width: 40 };
        builder.production(doc, Production::value(NamePattern::Any, wide, doc));
        builder.production(doc, Production::end_document());
        let err = builder.build().unwrap_err();
        assert!(matches!(err, Error::Grammar(_)));
        assert!(err.to_string().contains("width 40"));
    }

    #[test]
    fn bounded_integers_of_32_bits_are_accepted() {
        let mut builder = GrammarBuilder::new();
        let doc = builder.state("Document");
        let full = ValueDomain::BoundedInteger { min: 0, width: 32 };
        builder.production(doc, Production::value(NamePattern::Any, full, doc));
        builder.production(doc, Production::end_document());
        assert!(builder.build().is_ok());
    }

    #[test]
    fn redeclaring_a_label_returns_the_same_state() {
        let mut builder = GrammarBuilder::new();
        let a = builder.state("A");
        assert_eq!(builder.state("A"), a);
        assert_eq!(builder.lookup("A"), Some(a));
        assert_eq!(builder.lookup("B"), None);
    }
}
