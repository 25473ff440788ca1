// SPDX-License-Identifier: MPL-2.0

//! `AttributeId` - which attribute of a node a read, write or monitored item targets.

/// Identifies an attribute of a node. The numeric values match the OPC UA standard's
/// `AttributeId` enumeration (Part 6, Table 7).
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum AttributeId {
    NodeId = 1,
    NodeClass = 2,
    BrowseName = 3,
    DisplayName = 4,
    Description = 5,
    DataType = 14,
    /// The default attribute for reads, writes and monitored items.
    Value = 13,
}

impl Default for AttributeId {
    fn default() -> Self {
        AttributeId::Value
    }
}
