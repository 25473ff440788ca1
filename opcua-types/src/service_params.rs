// SPDX-License-Identifier: MPL-2.0

//! Small request/response structures shared by the Read/Browse/Subscription services.

use crate::{attribute_id::AttributeId, node_id::NodeId, qualified_name::QualifiedName};

/// Identifies the security applied to a secure channel, as advertised by an endpoint.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
pub enum MessageSecurityMode {
    /// No security.
    #[default]
    None,
    /// Messages are signed but not encrypted.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

/// An endpoint a server advertises via `GetEndpoints`.
#[derive(Clone, Debug, Default)]
pub struct EndpointDescription {
    /// The `opc.tcp://...` url of the endpoint.
    pub endpoint_url: String,
    /// The security mode required by this endpoint.
    pub security_mode: MessageSecurityMode,
    /// URI identifying the security policy, e.g. `http://opcfoundation.org/UA/SecurityPolicy#None`.
    pub security_policy_uri: String,
    /// Relative ranking servers use to indicate a preferred endpoint; higher is more secure.
    pub security_level: u8,
}

impl From<&str> for EndpointDescription {
    fn from(url: &str) -> Self {
        Self {
            endpoint_url: url.to_string(),
            ..Default::default()
        }
    }
}

/// Identifies a node attribute to read, write, or monitor.
#[derive(PartialEq, Eq, Clone, Debug, Hash)]
pub struct ReadValueId {
    /// The node to read/monitor.
    pub node_id: NodeId,
    /// Which attribute of the node.
    pub attribute_id: AttributeId,
    /// Sub-range of an array/string value, empty for the whole value.
    pub index_range: String,
    /// The requested data encoding, empty for the default.
    pub data_encoding: QualifiedName,
}

impl ReadValueId {
    /// Construct a `ReadValueId` targeting the `Value` attribute of `node_id`.
    pub fn value(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            attribute_id: AttributeId::Value,
            index_range: String::new(),
            data_encoding: QualifiedName::null(),
        }
    }
}

/// Direction of references to return from a `Browse` call.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum BrowseDirection {
    /// Follow forward (outgoing) references.
    Forward,
    /// Follow inverse (incoming) references.
    Inverse,
    /// Follow references in both directions.
    Both,
}

/// One reference returned by `Browse`/`BrowseNext`.
#[derive(Clone, Debug)]
pub struct ReferenceDescription {
    /// The type of reference followed to reach `node_id`.
    pub reference_type_id: NodeId,
    /// `true` if the reference points away from the browsed node.
    pub is_forward: bool,
    /// The node the reference points to.
    pub node_id: NodeId,
    /// The browse name of the target node.
    pub browse_name: QualifiedName,
}

/// The dead-band algorithm applied by a [`DataChangeFilter`].
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum DeadbandType {
    /// No dead-band; every change is reported.
    None,
    /// Absolute difference in engineering units.
    Absolute,
    /// Percentage of the node's configured EURange.
    Percent,
}

/// Filters out data changes that do not exceed the configured dead-band, for a
/// MonitoredItem whose attribute is `Value`.
#[derive(PartialEq, Clone, Debug)]
pub struct DataChangeFilter {
    /// Dead-band algorithm.
    pub deadband_type: DeadbandType,
    /// Dead-band value, interpreted according to `deadband_type`.
    pub deadband_value: f64,
}

/// Selects and filters the fields of events delivered for an event-attribute
/// MonitoredItem. The core treats the selected clauses as an opaque blob handed
/// to the server and echoed back in `EventNotification`s; constructing the
/// actual `SimpleAttributeOperand` list is a Transport/address-space concern.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct EventFilter {
    /// Opaque, server-specific encoded filter body.
    pub encoded: Vec<u8>,
}

/// Which timestamps the server should return alongside a value.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
pub enum TimestampsToReturn {
    /// Only the source timestamp.
    Source,
    /// Only the server timestamp.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// Neither timestamp.
    Neither,
}

/// Monitoring state of a MonitoredItem.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, Default)]
pub enum MonitoringMode {
    /// The item is not sampled at all.
    Disabled,
    /// The item is sampled and its latest value cached, but no notifications are sent.
    Sampling,
    /// The item is sampled and notifications are sent to the client.
    #[default]
    Reporting,
}
