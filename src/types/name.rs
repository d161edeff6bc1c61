use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Qualified name of a container or value: namespace plus local name.
///
/// The empty namespace is the default for names produced by bindings without
/// namespaces (for example JSON object keys).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QName {
    /// Namespace identifier; empty when unqualified.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub namespace: String,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Creates a qualified name.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Creates a name in the empty namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl From<&str> for QName {
    fn from(local: &str) -> Self {
        Self::local(local)
    }
}
