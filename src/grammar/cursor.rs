use std::sync::Arc;

use crate::error::{Error, Result};
use crate::grammar::{Grammar, GrammarState, StateId, Target};
use crate::table::NameId;

#[derive(Debug, Clone, Copy)]
struct Frame {
    state: StateId,
    container: NameId,
}

/// Per-session position within a shared [`Grammar`].
///
/// Entering a container pushes a frame for its content; leaving it pops back to the
/// enclosing level, which has already moved to its continuation state.
#[derive(Debug, Clone)]
pub struct GrammarCursor {
    grammar: Arc<Grammar>,
    stack: Vec<Frame>,
    finished: bool,
}

impl GrammarCursor {
    /// Cursor at the grammar's initial state with no open containers.
    pub fn new(grammar: Arc<Grammar>) -> Self {
        let initial = grammar.initial();
        Self {
            grammar,
            stack: vec![Frame {
                state: initial,
                container: NameId::EMPTY,
            }],
            finished: false,
        }
    }

    /// Grammar the cursor walks.
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Current state; an error once the document has ended.
    pub fn state_id(&self) -> Result<StateId> {
        if self.finished {
            return Err(Error::session("the document has already ended"));
        }
        self.stack
            .last()
            .map(|frame| frame.state)
            .ok_or_else(|| Error::session("grammar stack is empty"))
    }

    /// Current state, resolved.
    pub fn state(&self) -> Result<&GrammarState> {
        Ok(self.grammar.state(self.state_id()?))
    }

    /// Name of the innermost open container; [`NameId::EMPTY`] at document level
    /// or inside anonymous containers.
    pub fn container(&self) -> NameId {
        self.stack
            .last()
            .map_or(NameId::EMPTY, |frame| frame.container)
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// `true` after end-document.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Moves past an event type; `name` is the id of a container being entered.
    pub fn advance(&mut self, target: Target, name: Option<NameId>) -> Result<()> {
        let top = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::session("grammar stack is empty"))?;
        match target {
            Target::Next(next) => top.state = next,
            Target::Descend { content, next } => {
                top.state = next;
                self.stack.push(Frame {
                    state: content,
                    container: name.unwrap_or(NameId::EMPTY),
                });
            }
            Target::Ascend => {
                if self.stack.len() <= 1 {
                    return Err(Error::grammar("end-container without an open container"));
                }
                self.stack.pop();
            }
            Target::Finish => {
                if self.stack.len() != 1 {
                    return Err(Error::grammar(format!(
                        "end-document with {} open containers",
                        self.stack.len() - 1
                    )));
                }
                self.finished = true;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{NamePattern, Production};
    use crate::table::NameTable;
    use crate::types::{QName, ValueDomain};

    #[test]
    fn containers_push_and_pop_frames() {
        let mut builder = Grammar::builder();
        let doc = builder.state("Document");
        let top = builder.state("Top");
        let inner = builder.state("Inner");
        let end = builder.state("End");
        builder
            .production(doc, Production::start_document(top))
            .production(top, Production::start_container(NamePattern::exact("a"), inner, end))
            .production(inner, Production::value(NamePattern::Anonymous, ValueDomain::String, inner))
            .production(inner, Production::end_container())
            .production(end, Production::end_document());
        let grammar = Arc::new(builder.build().unwrap());
        let mut names = NameTable::new();
        let a = names.intern(&QName::local("a"));

        let mut cursor = GrammarCursor::new(grammar);
        cursor.advance(Target::Next(top), None).unwrap();
        cursor
            .advance(Target::Descend { content: inner, next: end }, Some(a))
            .unwrap();
        assert_eq!(cursor.depth(), 1);
        assert_eq!(cursor.container(), a);
        assert_eq!(cursor.state_id().unwrap(), inner);
        assert!(cursor.advance(Target::Finish, None).is_err());

        cursor.advance(Target::Ascend, None).unwrap();
        assert_eq!(cursor.state_id().unwrap(), end);
        assert_eq!(cursor.container(), NameId::EMPTY);
        cursor.advance(Target::Finish, None).unwrap();
        assert!(cursor.is_finished());
        assert!(cursor.state_id().is_err());
    }
}
