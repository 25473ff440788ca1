// SPDX-License-Identifier: MPL-2.0

//! Requested/revised subscription parameters and MonitoredItem creation specs.

use std::sync::Arc;

use opcua_types::{AttributeId, DataChangeFilter, EventFilter, MonitoringMode, NodeId};

use crate::subscriptions::notification::NotificationSink;

/// Requested or server-revised timing parameters for a subscription.
///
/// The client MUST keep `lifetime_count >= 3 * max_keep_alive_count`; see
/// [`SubscriptionParams::clamp_lifetime`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubscriptionParams {
    /// Requested/revised publishing interval, in milliseconds. A server may
    /// revise this to `0`, meaning "event-driven only, no client-side minimum
    /// pump rate"; the Publish pump then relies solely on keep-alive to keep
    /// requests outstanding (see [`crate::subscriptions::subscription`]).
    pub publishing_interval_ms: f64,
    /// Requested/revised subscription lifetime, expressed as a multiple of
    /// `publishing_interval_ms`.
    pub lifetime_count: u32,
    /// Requested/revised keep-alive count, expressed as a multiple of
    /// `publishing_interval_ms`.
    pub max_keep_alive_count: u32,
    /// Requested/revised cap on notifications delivered in one Publish response.
    pub max_notifications_per_publish: u32,
    /// Relative priority among this session's subscriptions.
    pub priority: u8,
}

impl Default for SubscriptionParams {
    fn default() -> Self {
        Self {
            publishing_interval_ms: 1_000.0,
            lifetime_count: 600,
            max_keep_alive_count: 20,
            max_notifications_per_publish: 0,
            priority: 0,
        }
    }
}

impl SubscriptionParams {
    /// Raise `lifetime_count` to `3 * max_keep_alive_count` if the caller's
    /// requested ratio is too low, logging a warning. Applied to outgoing
    /// requests defensively, mirroring the tolerance the client must already
    /// extend to a server's own revised values.
    pub(crate) fn clamp_lifetime(mut self) -> Self {
        let min_lifetime = self.max_keep_alive_count.saturating_mul(3);
        if self.lifetime_count < min_lifetime {
            log::warn!(
                "requested lifetime_count {} is below 3x max_keep_alive_count ({}); raising to {}",
                self.lifetime_count,
                self.max_keep_alive_count,
                min_lifetime
            );
            self.lifetime_count = min_lifetime;
        }
        self
    }
}

/// Tri-state update to a MonitoredItem's filter, used by `modify_monitored_item`.
///
/// OPC UA distinguishes "don't touch the filter" from "clear the filter" from
/// "install this new filter"; a plain `Option<Filter>` cannot express the
/// first case.
#[derive(Clone, Debug, Default)]
pub enum FilterUpdate {
    /// Keep whatever filter is already installed.
    #[default]
    Unset,
    /// Remove any filter currently installed.
    Null,
    /// Replace the filter with this one.
    New(MonitoringFilterSpec),
}

/// A filter attached at MonitoredItem creation time, or via [`FilterUpdate::New`].
#[derive(Clone, Debug)]
pub enum MonitoringFilterSpec {
    /// Dead-band filter on the `Value` attribute.
    DataChange(DataChangeFilter),
    /// Event selection/where-clause filter.
    Event(EventFilter),
}

/// The canonical OPC UA `BaseEventType` field names a caller typically wants
/// selected when no explicit [`EventFilter`] is supplied for an event
/// MonitoredItem. The core does not construct `SimpleAttributeOperand`
/// select clauses itself (that is address-space/Transport territory); this
/// list exists so a Transport implementation or caller can.
pub const DEFAULT_EVENT_FIELDS: &[&str] = &[
    "EventId",
    "EventType",
    "SourceNode",
    "SourceName",
    "Time",
    "ReceiveTime",
    "Message",
    "Severity",
];

/// Caller-supplied specification for a new MonitoredItem, passed to
/// [`crate::subscriptions::SubscriptionRegistry::add_monitored_item`].
#[derive(Clone)]
pub struct MonitoredItemSpec {
    /// The node to monitor.
    pub node_id: NodeId,
    /// Which attribute of the node.
    pub attribute_id: AttributeId,
    /// Requested sampling interval, in milliseconds.
    pub sampling_interval_ms: f64,
    /// Requested server-side notification queue depth. `0` asks for the
    /// server's default.
    pub queue_size: u32,
    /// `true` to discard the oldest queued notification on overflow, `false`
    /// to discard the newest.
    pub discard_oldest: bool,
    /// Initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// Optional filter.
    pub filter: Option<MonitoringFilterSpec>,
    /// Where notifications for this item are delivered.
    pub handler: Arc<dyn NotificationSink>,
}

impl MonitoredItemSpec {
    /// A MonitoredItem targeting the `Value` attribute of `node_id`, reporting
    /// via `handler`, with no filter and the server's default queue size.
    pub fn value(
        node_id: impl Into<NodeId>,
        sampling_interval_ms: f64,
        handler: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            attribute_id: AttributeId::Value,
            sampling_interval_ms,
            queue_size: 0,
            discard_oldest: true,
            monitoring_mode: MonitoringMode::Reporting,
            filter: None,
            handler,
        }
    }
}

/// Result of [`crate::subscriptions::SubscriptionRegistry::modify`].
#[derive(Clone, Copy, Debug)]
pub struct ModifyOutcome {
    /// The subscription's parameters after the call. Equal to the requested
    /// parameters that were sent if the server accepted them; unchanged from
    /// before the call if the server refused to modify at all.
    pub revised: SubscriptionParams,
    /// `true` if the server responded `ServiceUnsupported` to
    /// `ModifySubscription`. `revised` is then the subscription's prior,
    /// unchanged parameters and only the client's locally recorded
    /// `requested` parameters were updated.
    pub server_refused_modify: bool,
}

/// One row of [`crate::subscriptions::SubscriptionRegistry::list`].
#[derive(Clone, Debug)]
pub struct SubscriptionSummary {
    /// The subscription's stable client-side key.
    pub key: crate::subscriptions::SubscriptionKey,
    /// The subscription's current revised parameters.
    pub revised: SubscriptionParams,
    /// Number of MonitoredItems currently registered.
    pub item_count: usize,
}
