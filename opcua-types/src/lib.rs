// SPDX-License-Identifier: MPL-2.0

//! Shared value, identifier and status code types consumed by the OPC UA client core.
//!
//! This crate deliberately implements only the slice of the OPC UA type system the
//! client runtime needs to drive sessions and subscriptions: it is not a general
//! address-space or binary-encoding library.

mod attribute_id;
mod data_value;
mod guid;
mod identifier;
mod node_id;
mod qualified_name;
mod service_params;
mod status_code;
mod variant;

pub use attribute_id::AttributeId;
pub use data_value::{DataValue, Timestamp};
pub use guid::Guid;
pub use identifier::Identifier;
pub use node_id::{NodeId, NodeIdError};
pub use qualified_name::QualifiedName;
pub use service_params::{
    BrowseDirection, DataChangeFilter, DeadbandType, EndpointDescription, EventFilter,
    MessageSecurityMode, MonitoringMode, ReadValueId, ReferenceDescription, TimestampsToReturn,
};
pub use status_code::StatusCode;
pub use variant::{Variant, VariantScalarTypeId, VariantTypeMismatch};
