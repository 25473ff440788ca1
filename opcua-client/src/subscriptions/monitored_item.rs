// SPDX-License-Identifier: MPL-2.0

//! The client-side record of one MonitoredItem within a Subscription.

use opcua_types::{AttributeId, DataValue, MonitoringMode, NodeId};
use parking_lot::RwLock;

use crate::subscriptions::dispatch::ItemQueue;
use crate::subscriptions::key::ClientHandle;
use crate::subscriptions::params::MonitoringFilterSpec;

/// The part of a MonitoredItem's state that can change after creation:
/// server-revised sampling/queue parameters, monitoring mode, and filter.
pub(crate) struct MonitoredItemState {
    /// Server-assigned id. Not stable across Recovery.
    pub server_handle: u32,
    pub sampling_interval_ms: f64,
    pub queue_size: u32,
    pub discard_oldest: bool,
    pub monitoring_mode: MonitoringMode,
    pub filter: Option<MonitoringFilterSpec>,
    /// Latest value observed while `Sampling` or `Reporting`. Updated even
    /// when the mode is `Sampling` and nothing is delivered to the handler.
    pub last_value: Option<DataValue>,
}

/// One MonitoredItem, as tracked by its owning Subscription.
///
/// `client_handle` is assigned once by [`super::Subscription::add_monitored_item`]
/// and never changes, including across any number of Recovery events; only
/// `server_handle` (inside `state`) is re-assigned when the item is
/// recreated.
pub(crate) struct MonitoredItemEntry {
    pub client_handle: ClientHandle,
    pub target: NodeId,
    pub attribute_id: AttributeId,
    pub state: RwLock<MonitoredItemState>,
    pub queue: ItemQueue,
}

impl MonitoredItemEntry {
    pub(crate) fn snapshot_state(&self) -> (u32, f64, u32, bool, MonitoringMode) {
        let s = self.state.read();
        (
            s.server_handle,
            s.sampling_interval_ms,
            s.queue_size,
            s.discard_oldest,
            s.monitoring_mode,
        )
    }

    /// Record the latest observed value regardless of monitoring mode.
    pub(crate) fn set_last_value(&self, value: DataValue) {
        self.state.write().last_value = Some(value);
    }

    /// The latest value observed for this item, or `None` if no notification
    /// has been delivered yet.
    pub(crate) fn last_value(&self) -> Option<DataValue> {
        self.state.read().last_value.clone()
    }
}
