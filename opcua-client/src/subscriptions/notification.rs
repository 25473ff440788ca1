// SPDX-License-Identifier: MPL-2.0

//! `NotificationSink` - where a MonitoredItem's notifications are delivered.
//!
//! Modelled as an object-safe trait with default no-op methods rather than a
//! closed enum of closures, so a single handler type can respond to
//! whichever of data change, event, or status change notifications it
//! cares about. The `DataChangeCallback`/`EventCallback`/`Callbacks`
//! wrappers below give closure-based callers the same ergonomics without
//! having to implement the trait by hand.

use std::fmt;

use opcua_types::{DataValue, NodeId, StatusCode, Variant};

/// Event fields selected and returned for an event-attribute MonitoredItem,
/// in the order its `EventFilter`'s select clauses named them.
#[derive(Clone, Debug, Default)]
pub struct EventFields(pub Vec<Variant>);

/// Where a MonitoredItem's notifications are delivered.
///
/// Implementations MUST NOT block: dispatch already runs off the Publish
/// pump's critical path (see [`crate::subscriptions::dispatch`]), but a
/// handler that blocks still ties up one of the bounded dispatch pool's
/// workers and can stall delivery to every other MonitoredItem sharing it. A
/// handler that panics is caught and logged; it does not kill the dispatch
/// pool or the Publish pump (see [`crate::subscriptions::dispatch::deliver`]).
pub trait NotificationSink: Send + Sync {
    /// A new value for this item's `Value` attribute.
    #[allow(unused_variables)]
    fn on_data_change(&self, node_id: &NodeId, value: &Variant, data_value: &DataValue) {}

    /// A new event instance matching this item's EventFilter.
    #[allow(unused_variables)]
    fn on_event(&self, fields: &EventFields) {}

    /// The item's status changed, e.g. its target node disappeared across
    /// Recovery (`StatusCode::BAD_NODE_ID_UNKNOWN`).
    #[allow(unused_variables)]
    fn on_status_change(&self, status: StatusCode) {}
}

type DataChangeFn = dyn Fn(NodeId, Variant, DataValue) + Send + Sync;
type EventFn = dyn Fn(EventFields) + Send + Sync;
type StatusChangeFn = dyn Fn(StatusCode) + Send + Sync;

/// A [`NotificationSink`] built from a single data-change closure.
pub struct DataChangeCallback(Box<DataChangeFn>);

impl DataChangeCallback {
    /// Wrap a closure invoked for every data-change notification.
    pub fn new(f: impl Fn(NodeId, Variant, DataValue) + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl fmt::Debug for DataChangeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChangeCallback").finish_non_exhaustive()
    }
}

impl NotificationSink for DataChangeCallback {
    fn on_data_change(&self, node_id: &NodeId, value: &Variant, data_value: &DataValue) {
        (self.0)(node_id.clone(), value.clone(), data_value.clone())
    }
}

/// A [`NotificationSink`] built from a single event closure.
pub struct EventCallback(Box<EventFn>);

impl EventCallback {
    /// Wrap a closure invoked for every event notification.
    pub fn new(f: impl Fn(EventFields) + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }
}

impl NotificationSink for EventCallback {
    fn on_event(&self, fields: &EventFields) {
        (self.0)(fields.clone())
    }
}

/// A [`NotificationSink`] assembled from independent, optional closures,
/// for callers that want to react to more than one notification kind from
/// the same MonitoredItem without writing a dedicated type.
#[derive(Default)]
pub struct Callbacks {
    data_change: Option<Box<DataChangeFn>>,
    event: Option<Box<EventFn>>,
    status_change: Option<Box<StatusChangeFn>>,
}

impl Callbacks {
    /// An empty set of callbacks; every notification is silently dropped
    /// until `on_data_change`/`on_event`/`on_status_change` are called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data-change callback.
    pub fn on_data_change(
        mut self,
        f: impl Fn(NodeId, Variant, DataValue) + Send + Sync + 'static,
    ) -> Self {
        self.data_change = Some(Box::new(f));
        self
    }

    /// Set the event callback.
    pub fn on_event(mut self, f: impl Fn(EventFields) + Send + Sync + 'static) -> Self {
        self.event = Some(Box::new(f));
        self
    }

    /// Set the status-change callback.
    pub fn on_status_change(mut self, f: impl Fn(StatusCode) + Send + Sync + 'static) -> Self {
        self.status_change = Some(Box::new(f));
        self
    }
}

impl NotificationSink for Callbacks {
    fn on_data_change(&self, node_id: &NodeId, value: &Variant, data_value: &DataValue) {
        if let Some(f) = &self.data_change {
            f(node_id.clone(), value.clone(), data_value.clone())
        }
    }

    fn on_event(&self, fields: &EventFields) {
        if let Some(f) = &self.event {
            f(fields.clone())
        }
    }

    fn on_status_change(&self, status: StatusCode) {
        if let Some(f) = &self.status_change {
            f(status)
        }
    }
}
