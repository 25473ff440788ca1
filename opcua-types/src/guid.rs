// SPDX-License-Identifier: MPL-2.0

//! A 128-bit globally unique identifier, used as one of the `NodeId` identifier kinds.

use std::{fmt, str::FromStr};

use uuid::Uuid;

/// A 16-byte globally unique identifier.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub struct Guid(Uuid);

impl Guid {
    /// Create a new random GUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a GUID from its raw bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// The raw bytes of the GUID.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self(Uuid::nil())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Guid {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}
