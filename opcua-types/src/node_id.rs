// SPDX-License-Identifier: MPL-2.0

//! Contains the implementation of `NodeId`.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::{guid::Guid, identifier::Identifier};

/// Error returned when a `NodeId` cannot be parsed or converted.
#[derive(Debug)]
pub struct NodeIdError;

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid node id")
    }
}

impl std::error::Error for NodeIdError {}

/// An identifier for a node in the address space of an OPC UA server.
///
/// Equality and hashing are structural over `(namespace, identifier)`, matching the
/// wire semantics: two `NodeId`s refer to the same node iff both fields are equal.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct NodeId {
    /// The namespace index.
    pub namespace: u16,
    /// The identifier within that namespace.
    pub identifier: Identifier,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl NodeId {
    /// Construct a new `NodeId` from anything that can be turned into an [`Identifier`].
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// The null node id: namespace 0, numeric identifier 0.
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    /// `true` if this is the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && matches!(self.identifier, Identifier::Numeric(0))
    }

    /// The numeric value of this node id, if it is a numeric identifier.
    pub fn as_u32(&self) -> Option<u32> {
        match &self.identifier {
            Identifier::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    /// Parses the canonical string form specified by OPC UA Part 6 §5.3.1.10:
    /// `ns=<namespaceindex>;<type>=<value>`, where the `ns=` prefix is omitted for
    /// namespace 0 and `<type>` is one of `i`, `s`, `g`, `b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^(ns=(?P<ns>[0-9]+);)?(?P<t>[isgb])=(?P<v>.+)$").unwrap());

        let captures = RE.captures(s).ok_or(NodeIdError)?;
        let namespace = match captures.name("ns") {
            Some(ns) => ns.as_str().parse::<u16>().map_err(|_| NodeIdError)?,
            None => 0,
        };

        let kind = captures.name("t").unwrap().as_str();
        let value = captures.name("v").unwrap().as_str();
        let identifier = match kind {
            "i" => Identifier::Numeric(value.parse::<u32>().map_err(|_| NodeIdError)?),
            "s" => Identifier::String(value.to_string()),
            "g" => Identifier::Guid(Guid::from_str(value).map_err(|_| NodeIdError)?),
            "b" => {
                use base64::Engine;
                Identifier::Opaque(
                    base64::engine::general_purpose::STANDARD
                        .decode(value)
                        .map_err(|_| NodeIdError)?,
                )
            }
            _ => return Err(NodeIdError),
        };

        Ok(NodeId::new(namespace, identifier))
    }
}

impl From<(u16, u32)> for NodeId {
    fn from(v: (u16, u32)) -> Self {
        NodeId::new(v.0, v.1)
    }
}

impl From<(u16, &str)> for NodeId {
    fn from(v: (u16, &str)) -> Self {
        NodeId::new(v.0, v.1)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        NodeId::new(0, v)
    }
}

impl From<&str> for NodeId {
    fn from(v: &str) -> Self {
        v.parse().unwrap_or_else(|_| NodeId::new(0, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_canonical_forms() {
        assert_eq!(NodeId::new(0, 2253u32).to_string(), "i=2253");
        assert_eq!(NodeId::new(2, 2253u32).to_string(), "ns=2;i=2253");
        assert_eq!(NodeId::new(2, "Counter").to_string(), "ns=2;s=Counter");
    }

    #[test]
    fn parse_canonical_forms() {
        assert_eq!("i=2253".parse::<NodeId>().unwrap(), NodeId::new(0, 2253u32));
        assert_eq!(
            "ns=2;s=Counter".parse::<NodeId>().unwrap(),
            NodeId::new(2, "Counter")
        );
        assert!("garbage".parse::<NodeId>().is_err());
    }

    #[test]
    fn structural_equality_and_hash() {
        use std::collections::HashSet;
        let a = NodeId::new(2, "Counter");
        let b = NodeId::new(2, "Counter");
        let c = NodeId::new(3, "Counter");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn null_node_id() {
        assert!(NodeId::null().is_null());
        assert!(!NodeId::new(0, 1u32).is_null());
    }
}
