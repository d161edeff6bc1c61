use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::{EventKind, QName, Value};

/// One item of the structured event stream.
///
/// `None` names denote anonymous items (for example array members).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Event {
    /// Opens the stream; always the first event.
    StartDocument,
    /// Closes the stream; always the last event.
    EndDocument,
    /// Opens a container, named or anonymous.
    StartContainer(Option<QName>),
    /// Closes the innermost open container.
    EndContainer,
    /// A leaf value.
    Value {
        /// Name of the value; `None` inside lists.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        name: Option<QName>,
        /// The content.
        value: Value,
    },
}

impl Event {
    /// Start of a named container.
    pub fn start(name: impl Into<QName>) -> Self {
        Self::StartContainer(Some(name.into()))
    }

    /// Start of an anonymous container.
    pub fn start_anonymous() -> Self {
        Self::StartContainer(None)
    }

    /// Named value.
    pub fn value(name: impl Into<QName>, value: impl Into<Value>) -> Self {
        Self::Value {
            name: Some(name.into()),
            value: value.into(),
        }
    }

    /// Anonymous value.
    pub fn anonymous_value(value: impl Into<Value>) -> Self {
        Self::Value {
            name: None,
            value: value.into(),
        }
    }

    /// Item kind of the event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StartDocument => EventKind::StartDocument,
            Self::EndDocument => EventKind::EndDocument,
            Self::StartContainer(_) => EventKind::StartContainer,
            Self::EndContainer => EventKind::EndContainer,
            Self::Value { .. } => EventKind::Value,
        }
    }

    /// Name carried by a container start or a value.
    pub fn name(&self) -> Option<&QName> {
        match self {
            Self::StartContainer(name) | Self::Value { name, .. } => name.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartDocument => f.write_str("start-document"),
            Self::EndDocument => f.write_str("end-document"),
            Self::StartContainer(Some(name)) => write!(f, "start-container `{name}`"),
            Self::StartContainer(None) => f.write_str("start-container (anonymous)"),
            Self::EndContainer => f.write_str("end-container"),
            Self::Value {
                name: Some(name),
                value,
            } => write!(f, "{} value `{name}`", value.type_name()),
            Self::Value { name: None, value } => {
                write!(f, "{} value (anonymous)", value.type_name())
            }
        }
    }
}
