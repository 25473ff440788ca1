// SPDX-License-Identifier: MPL-2.0

//! `QualifiedName` - a name qualified by a namespace index.

use std::fmt;

/// A name qualified by a namespace index, used for browse names and similar fields.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Default)]
pub struct QualifiedName {
    /// Namespace index of the name.
    pub namespace_index: u16,
    /// The name itself.
    pub name: String,
}

impl QualifiedName {
    /// Create a new qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }

    /// Create a qualified name in namespace 0.
    pub fn null() -> Self {
        Self::default()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "{}:{}", self.namespace_index, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(name: &str) -> Self {
        Self::new(0, name)
    }
}
