#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grammar::{CodeLayout, Grammar, GrammarBuilder, NamePattern, Production, StateId};
use crate::types::ValueDomain;

/// Declarative grammar description in which states refer to each other by label.
///
/// With the `serde` feature this is the on-disk grammar format used by the
/// command-line tool.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrammarDefinition {
    /// Label of the starting state; the first state when absent.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub initial: Option<String>,
    /// States in declaration order.
    pub states: Vec<StateDefinition>,
}

/// One state of a [`GrammarDefinition`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateDefinition {
    /// Name other productions use to refer to the state.
    pub label: String,
    /// Event code numbering.
    #[cfg_attr(feature = "serde", serde(default))]
    pub layout: CodeLayout,
    /// Productions in priority order.
    pub productions: Vec<ProductionDefinition>,
}

/// Production whose target states are given by label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "camelCase"))]
pub enum ProductionDefinition {
    /// See [`Production::start_document`].
    StartDocument {
        /// Label of the state after the event.
        next: String,
        /// Code tier; 0 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        tier: u8,
    },
    /// See [`Production::end_document`].
    EndDocument {
        /// Code tier; 0 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        tier: u8,
    },
    /// See [`Production::start_container`].
    StartContainer {
        /// Names accepted.
        name: NamePattern,
        /// Label of the state reading the container content.
        content: String,
        /// Label of the state after the event.
        next: String,
        /// Code tier; 0 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        tier: u8,
    },
    /// See [`Production::end_container`].
    EndContainer {
        /// Code tier; 0 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        tier: u8,
    },
    /// See [`Production::value`].
    Value {
        /// Names accepted.
        name: NamePattern,
        /// Domain of the value.
        domain: ValueDomain,
        /// Label of the state after the event.
        next: String,
        /// Code tier; 0 when omitted.
        #[cfg_attr(feature = "serde", serde(default))]
        tier: u8,
    },
}

impl GrammarDefinition {
    /// Resolves labels and builds the grammar.
    pub fn compile(&self) -> Result<Grammar> {
        let mut builder = GrammarBuilder::new();
        for state in &self.states {
            if builder.lookup(&state.label).is_some() {
                return Err(Error::grammar(format!("duplicate state `{}`", state.label)));
            }
            builder.state(state.label.as_str());
        }
        let resolve = |builder: &GrammarBuilder, label: &str| -> Result<StateId> {
            builder
                .lookup(label)
                .ok_or_else(|| Error::grammar(format!("unknown state `{label}`")))
        };

        if let Some(initial) = &self.initial {
            let id = resolve(&builder, initial)?;
            builder.initial(id);
        }
        for state in &self.states {
            let id = resolve(&builder, &state.label)?;
            builder.layout(id, state.layout.clone());
            for production in &state.productions {
                let production = match production {
                    ProductionDefinition::StartDocument { next, tier } => {
                        Production::start_document(resolve(&builder, next)?).in_tier(*tier)
                    }
                    ProductionDefinition::EndDocument { tier } => {
                        Production::end_document().in_tier(*tier)
                    }
                    ProductionDefinition::StartContainer {
                        name,
                        content,
                        next,
                        tier,
                    } => Production::start_container(
                        name.clone(),
                        resolve(&builder, content)?,
                        resolve(&builder, next)?,
                    )
                    .in_tier(*tier),
                    ProductionDefinition::EndContainer { tier } => {
                        Production::end_container().in_tier(*tier)
                    }
                    ProductionDefinition::Value {
                        name,
                        domain,
                        next,
                        tier,
                    } => Production::value(name.clone(), *domain, resolve(&builder, next)?)
                        .in_tier(*tier),
                };
                builder.production(id, production);
            }
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> GrammarDefinition {
        GrammarDefinition {
            initial: None,
            states: vec![
                StateDefinition {
                    label: "Document".into(),
                    layout: CodeLayout::default(),
                    productions: vec![ProductionDefinition::StartDocument {
                        next: "Body".into(),
                        tier: 0,
                    }],
                },
                StateDefinition {
                    label: "Body".into(),
                    layout: CodeLayout::default(),
                    productions: vec![
                        ProductionDefinition::Value {
                            name: NamePattern::exact("a"),
                            domain: ValueDomain::Integer,
                            next: "Body".into(),
                            tier: 0,
                        },
                        ProductionDefinition::EndDocument { tier: 1 },
                    ],
                },
            ],
        }
    }

    #[test]
    fn labels_resolve_to_states() {
        let grammar = definition().compile().unwrap();
        assert_eq!(grammar.states().len(), 2);
        let body = grammar.lookup("Body").unwrap();
        let codes: Vec<u32> = grammar
            .state(body)
            .event_types()
            .iter()
            .map(|et| et.code().bit_len())
            .collect();
        assert_eq!(codes, [1, 1]);
    }

    #[test]
    fn unknown_labels_are_grammar_errors() {
        let mut def = definition();
        def.initial = Some("Missing".into());
        assert!(matches!(def.compile(), Err(Error::Grammar(_))));

        let mut def = definition();
        def.states.push(def.states[0].clone());
        assert!(def.compile().unwrap_err().to_string().contains("duplicate"));
    }
}
