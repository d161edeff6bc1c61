use std::fmt;
use std::io;

/// Convenient alias for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can be produced while scribing or scanning a stream.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wrapper around standard I/O errors.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The stream is corrupt: malformed header, out-of-range code or invalid literal.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The stream ended in the middle of a primitive.
    #[error("premature end of stream")]
    PrematureEnd,

    /// Encountered an unsupported feature (for example a disabled cargo feature).
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// The event has no matching event type in the current grammar state.
    #[error("event {event} is not permitted by grammar state `{state}`")]
    GrammarMismatch {
        /// Label of the grammar state consulted.
        state: String,
        /// Description of the offending event (kind and name).
        event: String,
    },

    /// A value cannot be represented in the domain the grammar declares for it.
    #[error("value {value:?} cannot be represented as {domain}")]
    ValueDomain {
        /// Name of the declared value domain.
        domain: String,
        /// Offending value in lexical form.
        value: String,
    },

    /// Options were rejected eagerly.
    #[error("configuration error: {0}")]
    Config(String),

    /// The grammar definition is internally inconsistent.
    #[error("grammar error: {0}")]
    Grammar(String),

    /// An operation was attempted in the wrong session state.
    #[error("session error: {0}")]
    SessionState(String),
}

impl Error {
    pub(crate) fn invalid<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidData(msg.to_string())
    }

    pub(crate) fn unsupported<T: fmt::Display>(msg: T) -> Self {
        Self::Unsupported(msg.to_string())
    }

    pub(crate) fn config<T: fmt::Display>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }

    pub(crate) fn grammar<T: fmt::Display>(msg: T) -> Self {
        Self::Grammar(msg.to_string())
    }

    pub(crate) fn session<T: fmt::Display>(msg: T) -> Self {
        Self::SessionState(msg.to_string())
    }

    pub(crate) fn domain<D: fmt::Display, V: fmt::Display>(domain: D, value: V) -> Self {
        Self::ValueDomain {
            domain: domain.to_string(),
            value: value.to_string(),
        }
    }

    /// Maps `UnexpectedEof` I/O failures onto [`Error::PrematureEnd`].
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::PrematureEnd
        } else {
            Self::Io(err)
        }
    }
}
