// SPDX-License-Identifier: MPL-2.0

//! The contract the client core is built against. A `Transport` establishes and
//! tears down secure channels and carries service requests/responses across
//! them; it owns OPC UA binary encoding and message framing. The core never
//! touches bytes on the wire directly, which is what makes it possible to test
//! Session/Subscription/Recovery logic against an in-memory fake.

use async_trait::async_trait;

use opcua_types::{
    BrowseDirection, DataChangeFilter, DataValue, EndpointDescription, EventFilter,
    MessageSecurityMode, MonitoringMode, NodeId, ReadValueId, ReferenceDescription, StatusCode,
    TimestampsToReturn, Variant,
};

use crate::error::OpcUaError;
use crate::identity::IdentityToken;

/// Opaque handle to an open secure channel. The core stores and compares these;
/// only the Transport implementation knows what, if anything, is inside.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Channel(pub u64);

/// Security policy, mode and identity requested when opening a channel.
///
/// `identity` is the token `open` must present to the server on
/// `ActivateSession`; a server that rejects it fails `open` with
/// `OpcUaError::Domain(StatusCode::BAD_IDENTITY_TOKEN_REJECTED)` rather than
/// silently falling back to an anonymous session.
#[derive(Clone, Debug, Default)]
pub struct SecurityOptions {
    /// Security mode to request.
    pub security_mode: MessageSecurityMode,
    /// Security policy URI to request, empty for `None`.
    pub security_policy_uri: String,
    /// Identity to activate the session with.
    pub identity: IdentityToken,
}

/// A request/response correlation identifier. The Transport must support many
/// of these outstanding concurrently on the same channel.
pub type RequestId = u32;

/// A durable filter attached when creating or modifying a MonitoredItem.
#[derive(Clone, Debug, PartialEq)]
pub enum MonitoringFilter {
    /// No filter; every sampled value is a candidate notification.
    None,
    /// Dead-band filter on the `Value` attribute.
    DataChange(DataChangeFilter),
    /// Event selection/where-clause filter.
    Event(EventFilter),
}

/// Parameters for adding one MonitoredItem to a subscription.
#[derive(Clone, Debug)]
pub struct MonitoredItemCreateParams {
    /// Attribute and node to monitor.
    pub item_to_monitor: ReadValueId,
    /// Client-assigned handle, echoed back in notifications.
    pub client_handle: u32,
    /// Requested sampling interval in milliseconds.
    pub sampling_interval_ms: f64,
    /// Depth of the server-side notification queue.
    pub queue_size: u32,
    /// `true` to keep only the newest notification when the queue is full.
    pub discard_oldest: bool,
    /// Optional filter.
    pub filter: MonitoringFilter,
    /// Initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
}

/// Server-revised result of creating or modifying a MonitoredItem.
#[derive(Clone, Debug)]
pub struct MonitoredItemResult {
    /// Per-item outcome. Good on success.
    pub status: StatusCode,
    /// Server-assigned id, used to address the item in subsequent modify/delete calls.
    pub monitored_item_id: u32,
    /// Revised sampling interval.
    pub revised_sampling_interval_ms: f64,
    /// Revised queue size.
    pub revised_queue_size: u32,
}

/// A request carried across an open channel. One variant per service the
/// client core needs; everything else (session and secure-channel
/// establishment messages) is handled inside `open`/`close`.
#[derive(Clone, Debug)]
pub enum ServiceRequest {
    /// `GetEndpoints`.
    GetEndpoints,
    /// `Read`.
    Read {
        nodes_to_read: Vec<ReadValueId>,
        timestamps_to_return: TimestampsToReturn,
    },
    /// `Write`.
    Write {
        nodes_to_write: Vec<(ReadValueId, DataValue)>,
    },
    /// `Browse`.
    Browse {
        node_id: NodeId,
        direction: BrowseDirection,
        reference_type_id: Option<NodeId>,
        max_references: u32,
    },
    /// `Call`.
    Call {
        object_id: NodeId,
        method_id: NodeId,
        input_arguments: Vec<Variant>,
    },
    /// `CreateSubscription`.
    CreateSubscription {
        requested_publishing_interval_ms: f64,
        requested_lifetime_count: u32,
        requested_max_keep_alive_count: u32,
        requested_max_notifications_per_publish: u32,
        priority: u8,
        publishing_enabled: bool,
    },
    /// `ModifySubscription`.
    ModifySubscription {
        subscription_id: u32,
        requested_publishing_interval_ms: f64,
        requested_lifetime_count: u32,
        requested_max_keep_alive_count: u32,
        requested_max_notifications_per_publish: u32,
        priority: u8,
    },
    /// `DeleteSubscriptions`.
    DeleteSubscriptions { subscription_ids: Vec<u32> },
    /// `SetPublishingMode`.
    SetPublishingMode {
        subscription_ids: Vec<u32>,
        publishing_enabled: bool,
    },
    /// `CreateMonitoredItems`.
    CreateMonitoredItems {
        subscription_id: u32,
        items: Vec<MonitoredItemCreateParams>,
    },
    /// `ModifyMonitoredItems`.
    ModifyMonitoredItems {
        subscription_id: u32,
        items: Vec<(u32, MonitoredItemCreateParams)>,
    },
    /// `DeleteMonitoredItems`.
    DeleteMonitoredItems {
        subscription_id: u32,
        monitored_item_ids: Vec<u32>,
    },
    /// `SetMonitoringMode`.
    SetMonitoringMode {
        subscription_id: u32,
        monitoring_mode: MonitoringMode,
        monitored_item_ids: Vec<u32>,
    },
    /// `Publish`, acknowledging previously received sequence numbers.
    Publish {
        subscription_acknowledgements: Vec<(u32, u32)>,
    },
}

/// The response matching a [`ServiceRequest`] variant of the same name.
#[derive(Clone, Debug)]
pub enum ServiceResponse {
    GetEndpoints {
        endpoints: Vec<EndpointDescription>,
    },
    Read {
        results: Vec<DataValue>,
    },
    Write {
        results: Vec<StatusCode>,
    },
    Browse {
        references: Vec<ReferenceDescription>,
    },
    Call {
        status: StatusCode,
        output_arguments: Vec<Variant>,
    },
    CreateSubscription {
        subscription_id: u32,
        revised_publishing_interval_ms: f64,
        revised_lifetime_count: u32,
        revised_max_keep_alive_count: u32,
        revised_max_notifications_per_publish: u32,
    },
    ModifySubscription {
        revised_publishing_interval_ms: f64,
        revised_lifetime_count: u32,
        revised_max_keep_alive_count: u32,
        revised_max_notifications_per_publish: u32,
    },
    DeleteSubscriptions {
        results: Vec<StatusCode>,
    },
    SetPublishingMode {
        results: Vec<StatusCode>,
    },
    CreateMonitoredItems {
        results: Vec<MonitoredItemResult>,
    },
    ModifyMonitoredItems {
        results: Vec<MonitoredItemResult>,
    },
    DeleteMonitoredItems {
        results: Vec<StatusCode>,
    },
    SetMonitoringMode {
        results: Vec<StatusCode>,
    },
    Publish {
        subscription_id: u32,
        sequence_number: u32,
        more_notifications: bool,
        data_change_notifications: Vec<(u32, DataValue)>,
        event_notifications: Vec<(u32, Vec<Variant>)>,
        status_change: Option<StatusCode>,
        available_sequence_numbers: Vec<u32>,
    },
}

/// The dependency contract Session, SubscriptionRegistry and Recovery are
/// written against. Implementations own the actual wire protocol; the core
/// never encodes or frames a message itself.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish a secure channel to `url` with the given security options,
    /// activating the session with `security.identity`.
    ///
    /// If the server rejects the identity (bad credentials, expired
    /// certificate, unsupported token type), the implementation must fail
    /// this call with `OpcUaError::Domain(StatusCode::BAD_IDENTITY_TOKEN_REJECTED)`;
    /// `Session::connect` surfaces that as its `ActivateFailed` outcome.
    async fn open(&self, url: &str, security: &SecurityOptions) -> Result<Channel, OpcUaError>;

    /// Best-effort teardown of a previously opened channel.
    async fn close(&self, channel: &Channel);

    /// Send `request` over `channel` and await its matching response. Must
    /// support many concurrent outstanding calls on the same channel,
    /// correlated by request id internally to the implementation.
    async fn request(
        &self,
        channel: &Channel,
        request: ServiceRequest,
    ) -> Result<ServiceResponse, OpcUaError>;

    /// Cheap, local liveness check. Must not touch the network.
    fn is_alive(&self, channel: &Channel) -> bool;
}
