// SPDX-License-Identifier: MPL-2.0

//! The kind of identifier carried by a [`NodeId`](crate::NodeId).

use std::fmt;

use crate::guid::Guid;

/// The identifier half of a `NodeId`: numeric, string, GUID or opaque bytes.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub enum Identifier {
    /// Numeric identifier, e.g. `i=2253`.
    Numeric(u32),
    /// String identifier, e.g. `s=Counter`.
    String(String),
    /// GUID identifier, e.g. `g=...`.
    Guid(Guid),
    /// Opaque byte-string identifier, e.g. `b=...`.
    Opaque(Vec<u8>),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(v) => write!(f, "s={v}"),
            Identifier::Guid(v) => write!(f, "g={v}"),
            Identifier::Opaque(v) => write!(f, "b={}", base64_encode(v)),
        }
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl From<i32> for Identifier {
    fn from(v: i32) -> Self {
        Identifier::Numeric(v as u32)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier::String(v.to_string())
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(v)
    }
}

impl From<Guid> for Identifier {
    fn from(v: Guid) -> Self {
        Identifier::Guid(v)
    }
}

impl From<Vec<u8>> for Identifier {
    fn from(v: Vec<u8>) -> Self {
        Identifier::Opaque(v)
    }
}
