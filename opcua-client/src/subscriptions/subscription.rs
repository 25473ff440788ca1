// SPDX-License-Identifier: MPL-2.0

//! The per-subscription state machine: `Created -> Publishing <-> PausedPublishing
//! -> Deleted`. Owns its MonitoredItems and the sequencing state (pending acks,
//! reorder buffer) the session-wide [`crate::subscriptions::pump`] needs to
//! deliver notifications to them in order.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use opcua_core::error::OpcUaError;
use opcua_core::transport::{
    MonitoredItemCreateParams, MonitoringFilter as TransportFilter, ServiceRequest,
    ServiceResponse,
};
use opcua_types::{
    DataValue, MonitoringMode, QualifiedName, ReadValueId, StatusCode, Variant,
};

use crate::session::request::DEFAULT_REQUEST_TIMEOUT;
use crate::session::Session;
use crate::subscriptions::dispatch::{DispatchPool, QueuedNotification};
use crate::subscriptions::key::{ClientHandle, SubscriptionKey};
use crate::subscriptions::monitored_item::{MonitoredItemEntry, MonitoredItemState};
use crate::subscriptions::notification::EventFields;
use crate::subscriptions::params::{
    FilterUpdate, ModifyOutcome, MonitoredItemSpec, MonitoringFilterSpec, SubscriptionParams,
};

/// Lifecycle state of a Subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionLifecycle {
    /// Just created; transitions immediately to `Publishing` or `PausedPublishing`.
    Created,
    /// Live, with `publishing_enabled == true`.
    Publishing,
    /// Live, with `publishing_enabled == false`. The Publish pump keeps
    /// running and acking; the server simply sends no data-change/event
    /// notifications while paused.
    PausedPublishing,
    /// Terminal; the subscription has been deleted.
    Deleted,
}

/// One Publish response's worth of notifications for a single subscription.
pub(crate) struct PublishEnvelope {
    pub sequence_number: u32,
    pub data_change: Vec<(ClientHandle, DataValue)>,
    pub events: Vec<(ClientHandle, Vec<Variant>)>,
    pub status_change: Option<StatusCode>,
}

#[derive(Default)]
struct ReorderState {
    next_expected: Option<u32>,
    buffer: BTreeMap<u32, PublishEnvelope>,
}

/// Client-side handle to a live or pending subscription. Cheap to clone: an
/// `Arc` over shared state, so the session-wide Publish pump, the
/// [`super::SubscriptionRegistry`] and Recovery can all hold one.
#[derive(Clone)]
pub(crate) struct Subscription {
    pub(crate) inner: Arc<SubscriptionInner>,
}

pub(crate) struct SubscriptionInner {
    key: SubscriptionKey,
    server_id: RwLock<u32>,
    requested: RwLock<SubscriptionParams>,
    revised: RwLock<SubscriptionParams>,
    publishing_enabled: AtomicBool,
    lifecycle: RwLock<SubscriptionLifecycle>,
    items: RwLock<HashMap<ClientHandle, Arc<MonitoredItemEntry>>>,
    next_client_handle: AtomicU32,
    pending_acks: Mutex<VecDeque<u32>>,
    reorder: Mutex<ReorderState>,
    dispatch_pool: Arc<DispatchPool>,
}

/// Outstanding-Publish-request contribution of one subscription, per the
/// spec's `max(2, ceil(revised.publishing_interval_ms / 1000))` rule. A
/// server-revised interval of `0` ("event-driven only") falls out of this
/// formula naturally: `ceil(0 / 1000) == 0`, so the subscription still
/// contributes the floor of 2.
pub(crate) fn publish_request_share(revised: SubscriptionParams) -> usize {
    let rate_component = (revised.publishing_interval_ms / 1000.0).ceil();
    let rate_component = if rate_component.is_finite() && rate_component > 0.0 {
        rate_component as usize
    } else {
        0
    };
    rate_component.max(2)
}

fn to_transport_filter(filter: Option<&MonitoringFilterSpec>) -> TransportFilter {
    match filter {
        None => TransportFilter::None,
        Some(MonitoringFilterSpec::DataChange(f)) => TransportFilter::DataChange(f.clone()),
        Some(MonitoringFilterSpec::Event(f)) => TransportFilter::Event(f.clone()),
    }
}

impl Subscription {
    /// Issue `CreateSubscription` against `session` and build a new, empty
    /// `Subscription` from the result. Publishing starts enabled; callers
    /// wanting it paused should call `set_publishing_mode(key, false)`
    /// immediately afterwards.
    pub(crate) async fn create(
        session: &Session,
        requested: SubscriptionParams,
        dispatch_pool: Arc<DispatchPool>,
    ) -> Result<Subscription, OpcUaError> {
        let requested = requested.clamp_lifetime();
        let request = ServiceRequest::CreateSubscription {
            requested_publishing_interval_ms: requested.publishing_interval_ms,
            requested_lifetime_count: requested.lifetime_count,
            requested_max_keep_alive_count: requested.max_keep_alive_count,
            requested_max_notifications_per_publish: requested.max_notifications_per_publish,
            priority: requested.priority,
            publishing_enabled: true,
        };
        let response = session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await?;
        let ServiceResponse::CreateSubscription {
            subscription_id,
            revised_publishing_interval_ms,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            revised_max_notifications_per_publish,
        } = response
        else {
            return Err(OpcUaError::Protocol(
                "unexpected response to CreateSubscription".to_string(),
            ));
        };

        if revised_lifetime_count < 3 * revised_max_keep_alive_count {
            log::warn!(
                "server revised subscription {subscription_id} to lifetime_count {revised_lifetime_count} \
                 < 3x max_keep_alive_count {revised_max_keep_alive_count}; accepting anyway"
            );
        }

        let revised = SubscriptionParams {
            publishing_interval_ms: revised_publishing_interval_ms,
            lifetime_count: revised_lifetime_count,
            max_keep_alive_count: revised_max_keep_alive_count,
            max_notifications_per_publish: revised_max_notifications_per_publish,
            priority: requested.priority,
        };

        Ok(Subscription {
            inner: Arc::new(SubscriptionInner {
                key: SubscriptionKey::next(),
                server_id: RwLock::new(subscription_id),
                requested: RwLock::new(requested),
                revised: RwLock::new(revised),
                publishing_enabled: AtomicBool::new(true),
                lifecycle: RwLock::new(SubscriptionLifecycle::Publishing),
                items: RwLock::new(HashMap::new()),
                next_client_handle: AtomicU32::new(1),
                pending_acks: Mutex::new(VecDeque::new()),
                reorder: Mutex::new(ReorderState::default()),
                dispatch_pool,
            }),
        })
    }

    /// Stable, client-generated identity. Never changes, including across Recovery.
    pub fn key(&self) -> SubscriptionKey {
        self.inner.key
    }

    /// Current server-assigned id. Changes every time [`Self::recreate`] runs.
    pub(crate) fn server_id(&self) -> u32 {
        *self.inner.server_id.read()
    }

    /// The subscription's current, server-revised parameters.
    pub fn revised(&self) -> SubscriptionParams {
        *self.inner.revised.read()
    }

    /// `true` once [`Self::delete`] has run.
    pub(crate) fn is_deleted(&self) -> bool {
        *self.inner.lifecycle.read() == SubscriptionLifecycle::Deleted
    }

    /// Number of MonitoredItems currently registered.
    pub(crate) fn item_count(&self) -> usize {
        self.inner.items.read().len()
    }

    /// The latest value observed for a MonitoredItem, regardless of its
    /// monitoring mode. `None` if the handle is unknown or nothing has been
    /// delivered yet.
    pub(crate) fn last_value(&self, client_handle: ClientHandle) -> Option<DataValue> {
        self.inner.items.read().get(&client_handle)?.last_value()
    }

    pub(crate) async fn modify(
        &self,
        session: &Session,
        requested: SubscriptionParams,
    ) -> Result<ModifyOutcome, OpcUaError> {
        let requested = requested.clamp_lifetime();
        let request = ServiceRequest::ModifySubscription {
            subscription_id: self.server_id(),
            requested_publishing_interval_ms: requested.publishing_interval_ms,
            requested_lifetime_count: requested.lifetime_count,
            requested_max_keep_alive_count: requested.max_keep_alive_count,
            requested_max_notifications_per_publish: requested.max_notifications_per_publish,
        };
        match session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await {
            Ok(ServiceResponse::ModifySubscription {
                revised_publishing_interval_ms,
                revised_lifetime_count,
                revised_max_keep_alive_count,
                revised_max_notifications_per_publish,
            }) => {
                let revised = SubscriptionParams {
                    publishing_interval_ms: revised_publishing_interval_ms,
                    lifetime_count: revised_lifetime_count,
                    max_keep_alive_count: revised_max_keep_alive_count,
                    max_notifications_per_publish: revised_max_notifications_per_publish,
                    priority: requested.priority,
                };
                if revised.lifetime_count < 3 * revised.max_keep_alive_count {
                    log::warn!(
                        "server revised subscription {} modify to a lifetime/keep-alive ratio below 3:1; accepting",
                        self.inner.key
                    );
                }
                *self.inner.revised.write() = revised;
                *self.inner.requested.write() = requested;
                Ok(ModifyOutcome {
                    revised,
                    server_refused_modify: false,
                })
            }
            Ok(_) => Err(OpcUaError::Protocol(
                "unexpected response to ModifySubscription".to_string(),
            )),
            Err(OpcUaError::Domain(status))
                if status.bits() == StatusCode::BAD_SERVICE_UNSUPPORTED.bits() =>
            {
                log::warn!(
                    "server does not support ModifySubscription for {}; operating on server defaults",
                    self.inner.key
                );
                *self.inner.requested.write() = requested;
                Ok(ModifyOutcome {
                    revised: self.revised(),
                    server_refused_modify: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn set_publishing_mode(
        &self,
        session: &Session,
        enabled: bool,
    ) -> Result<(), OpcUaError> {
        let request = ServiceRequest::SetPublishingMode {
            subscription_ids: vec![self.server_id()],
            publishing_enabled: enabled,
        };
        match session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::SetPublishingMode { results } if results.len() == 1 => {
                if results[0].is_good() {
                    self.set_publishing_mode_local(enabled);
                    Ok(())
                } else {
                    Err(OpcUaError::Domain(results[0]))
                }
            }
            _ => Err(OpcUaError::Protocol(
                "unexpected response to SetPublishingMode".to_string(),
            )),
        }
    }

    fn set_publishing_mode_local(&self, enabled: bool) {
        self.inner.publishing_enabled.store(enabled, Ordering::Release);
        *self.inner.lifecycle.write() = if enabled {
            SubscriptionLifecycle::Publishing
        } else {
            SubscriptionLifecycle::PausedPublishing
        };
    }

    pub(crate) async fn add_monitored_item(
        &self,
        session: &Session,
        spec: MonitoredItemSpec,
    ) -> Result<ClientHandle, OpcUaError> {
        let client_handle = self.inner.next_client_handle.fetch_add(1, Ordering::Relaxed);
        let create_params = MonitoredItemCreateParams {
            item_to_monitor: ReadValueId {
                node_id: spec.node_id.clone(),
                attribute_id: spec.attribute_id,
                index_range: String::new(),
                data_encoding: QualifiedName::null(),
            },
            client_handle,
            sampling_interval_ms: spec.sampling_interval_ms,
            queue_size: spec.queue_size,
            discard_oldest: spec.discard_oldest,
            filter: to_transport_filter(spec.filter.as_ref()),
            monitoring_mode: spec.monitoring_mode,
        };
        let request = ServiceRequest::CreateMonitoredItems {
            subscription_id: self.server_id(),
            items: vec![create_params],
        };
        let response = session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await?;
        let ServiceResponse::CreateMonitoredItems { mut results } = response else {
            return Err(OpcUaError::Protocol(
                "unexpected response to CreateMonitoredItems".to_string(),
            ));
        };
        if results.len() != 1 {
            return Err(OpcUaError::Protocol(
                "CreateMonitoredItems returned an unexpected number of results".to_string(),
            ));
        }
        let result = results.remove(0);
        if !result.status.is_good() {
            return Err(OpcUaError::Domain(result.status));
        }

        let entry = Arc::new(MonitoredItemEntry {
            client_handle,
            target: spec.node_id,
            attribute_id: spec.attribute_id,
            state: RwLock::new(MonitoredItemState {
                server_handle: result.monitored_item_id,
                sampling_interval_ms: result.revised_sampling_interval_ms,
                queue_size: result.revised_queue_size,
                discard_oldest: spec.discard_oldest,
                monitoring_mode: spec.monitoring_mode,
                filter: spec.filter,
                last_value: None,
            }),
            queue: self.inner.dispatch_pool.item_queue(spec.handler),
        });
        self.inner.items.write().insert(client_handle, entry);
        Ok(client_handle)
    }

    pub(crate) async fn remove_monitored_item(
        &self,
        session: &Session,
        client_handle: ClientHandle,
    ) -> Result<(), OpcUaError> {
        let server_handle = {
            let items = self.inner.items.read();
            let entry = items
                .get(&client_handle)
                .ok_or_else(|| OpcUaError::Usage(format!("unknown client handle {client_handle}")))?;
            entry.state.read().server_handle
        };
        let request = ServiceRequest::DeleteMonitoredItems {
            subscription_id: self.server_id(),
            monitored_item_ids: vec![server_handle],
        };
        match session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::DeleteMonitoredItems { results } if results.len() == 1 => {
                self.inner.items.write().remove(&client_handle);
                if results[0].is_good() {
                    Ok(())
                } else {
                    Err(OpcUaError::Domain(results[0]))
                }
            }
            _ => Err(OpcUaError::Protocol(
                "unexpected response to DeleteMonitoredItems".to_string(),
            )),
        }
    }

    pub(crate) async fn modify_monitored_item(
        &self,
        session: &Session,
        client_handle: ClientHandle,
        sampling_interval_ms: f64,
        queue_size: u32,
        filter: FilterUpdate,
    ) -> Result<(), OpcUaError> {
        let (server_handle, existing_filter, target, attribute_id) = {
            let items = self.inner.items.read();
            let entry = items
                .get(&client_handle)
                .ok_or_else(|| OpcUaError::Usage(format!("unknown client handle {client_handle}")))?;
            let state = entry.state.read();
            (
                state.server_handle,
                state.filter.clone(),
                entry.target.clone(),
                entry.attribute_id,
            )
        };
        let new_filter = match &filter {
            FilterUpdate::Unset => existing_filter.clone(),
            FilterUpdate::Null => None,
            FilterUpdate::New(f) => Some(f.clone()),
        };
        let create_params = MonitoredItemCreateParams {
            item_to_monitor: ReadValueId {
                node_id: target,
                attribute_id,
                index_range: String::new(),
                data_encoding: QualifiedName::null(),
            },
            client_handle,
            sampling_interval_ms,
            queue_size,
            discard_oldest: true,
            filter: to_transport_filter(new_filter.as_ref()),
            monitoring_mode: MonitoringMode::Reporting,
        };
        let request = ServiceRequest::ModifyMonitoredItems {
            subscription_id: self.server_id(),
            items: vec![(server_handle, create_params)],
        };
        match session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::ModifyMonitoredItems { results } if results.len() == 1 => {
                let result = &results[0];
                if result.status.is_good() {
                    let items = self.inner.items.read();
                    if let Some(entry) = items.get(&client_handle) {
                        let mut state = entry.state.write();
                        state.sampling_interval_ms = result.revised_sampling_interval_ms;
                        state.queue_size = result.revised_queue_size;
                        state.filter = new_filter;
                    }
                    Ok(())
                } else {
                    Err(OpcUaError::Domain(result.status))
                }
            }
            _ => Err(OpcUaError::Protocol(
                "unexpected response to ModifyMonitoredItems".to_string(),
            )),
        }
    }

    pub(crate) async fn set_monitoring_mode(
        &self,
        session: &Session,
        client_handles: &[ClientHandle],
        mode: MonitoringMode,
    ) -> Result<(), OpcUaError> {
        let server_handles = {
            let items = self.inner.items.read();
            let mut server_handles = Vec::with_capacity(client_handles.len());
            for handle in client_handles {
                let entry = items
                    .get(handle)
                    .ok_or_else(|| OpcUaError::Usage(format!("unknown client handle {handle}")))?;
                server_handles.push(entry.state.read().server_handle);
            }
            server_handles
        };
        let request = ServiceRequest::SetMonitoringMode {
            subscription_id: self.server_id(),
            monitoring_mode: mode,
            monitored_item_ids: server_handles,
        };
        match session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await? {
            ServiceResponse::SetMonitoringMode { results } if results.len() == client_handles.len() => {
                let items = self.inner.items.read();
                for (handle, status) in client_handles.iter().zip(results.iter()) {
                    if status.is_good() {
                        if let Some(entry) = items.get(handle) {
                            entry.state.write().monitoring_mode = mode;
                        }
                    }
                }
                Ok(())
            }
            _ => Err(OpcUaError::Protocol(
                "unexpected response to SetMonitoringMode".to_string(),
            )),
        }
    }

    pub(crate) async fn delete(&self, session: &Session) -> Result<(), OpcUaError> {
        *self.inner.lifecycle.write() = SubscriptionLifecycle::Deleted;
        let server_id = self.server_id();
        let request = ServiceRequest::DeleteSubscriptions {
            subscription_ids: vec![server_id],
        };
        // Best-effort: even if the server can no longer be reached, the
        // subscription is locally gone the moment the registry drops it.
        let _ = session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await;
        Ok(())
    }

    /// Recovery step 4: re-create this subscription and every MonitoredItem
    /// it owns against a freshly (re)connected `session`, preserving
    /// `key()` and every item's `client_handle`.
    pub(crate) async fn recreate(&self, session: &Session) -> Result<(), OpcUaError> {
        let requested = *self.inner.requested.read();
        let request = ServiceRequest::CreateSubscription {
            requested_publishing_interval_ms: requested.publishing_interval_ms,
            requested_lifetime_count: requested.lifetime_count,
            requested_max_keep_alive_count: requested.max_keep_alive_count,
            requested_max_notifications_per_publish: requested.max_notifications_per_publish,
            priority: requested.priority,
            publishing_enabled: true,
        };
        let response = session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await?;
        let ServiceResponse::CreateSubscription {
            subscription_id,
            revised_publishing_interval_ms,
            revised_lifetime_count,
            revised_max_keep_alive_count,
            revised_max_notifications_per_publish,
        } = response
        else {
            return Err(OpcUaError::Protocol(
                "unexpected response to CreateSubscription during recovery".to_string(),
            ));
        };

        *self.inner.server_id.write() = subscription_id;
        *self.inner.revised.write() = SubscriptionParams {
            publishing_interval_ms: revised_publishing_interval_ms,
            lifetime_count: revised_lifetime_count,
            max_keep_alive_count: revised_max_keep_alive_count,
            max_notifications_per_publish: revised_max_notifications_per_publish,
            priority: requested.priority,
        };
        self.inner.pending_acks.lock().clear();
        *self.inner.reorder.lock() = ReorderState::default();

        // Client handles are monotonically assigned, so sorting them
        // ascending recovers the original insertion order without needing a
        // separate order-tracking structure.
        let mut handles: Vec<ClientHandle> = self.inner.items.read().keys().copied().collect();
        handles.sort_unstable();

        for client_handle in handles {
            let entry = self.inner.items.read().get(&client_handle).cloned();
            let Some(entry) = entry else { continue };
            self.recreate_item(session, subscription_id, &entry).await;
        }

        if !self.inner.publishing_enabled.load(Ordering::Acquire) {
            let _ = session
                .send_raw(
                    ServiceRequest::SetPublishingMode {
                        subscription_ids: vec![subscription_id],
                        publishing_enabled: false,
                    },
                    DEFAULT_REQUEST_TIMEOUT,
                )
                .await;
        }

        *self.inner.lifecycle.write() = if self.inner.publishing_enabled.load(Ordering::Acquire) {
            SubscriptionLifecycle::Publishing
        } else {
            SubscriptionLifecycle::PausedPublishing
        };
        Ok(())
    }

    async fn recreate_item(&self, session: &Session, subscription_id: u32, entry: &Arc<MonitoredItemEntry>) {
        let (_, sampling_interval_ms, queue_size, discard_oldest, monitoring_mode) =
            entry.snapshot_state();
        let filter = entry.state.read().filter.clone();
        let create_params = MonitoredItemCreateParams {
            item_to_monitor: ReadValueId {
                node_id: entry.target.clone(),
                attribute_id: entry.attribute_id,
                index_range: String::new(),
                data_encoding: QualifiedName::null(),
            },
            client_handle: entry.client_handle,
            sampling_interval_ms,
            queue_size,
            discard_oldest,
            filter: to_transport_filter(filter.as_ref()),
            monitoring_mode,
        };
        let request = ServiceRequest::CreateMonitoredItems {
            subscription_id,
            items: vec![create_params],
        };
        let outcome = session.send_raw(request, DEFAULT_REQUEST_TIMEOUT).await;
        match outcome {
            Ok(ServiceResponse::CreateMonitoredItems { results }) if results.len() == 1 => {
                let result = &results[0];
                if result.status.is_good() {
                    {
                        let mut state = entry.state.write();
                        state.server_handle = result.monitored_item_id;
                        state.sampling_interval_ms = result.revised_sampling_interval_ms;
                        state.queue_size = result.revised_queue_size;
                    }
                    if monitoring_mode != MonitoringMode::Reporting {
                        let _ = self
                            .set_monitoring_mode(session, &[entry.client_handle], monitoring_mode)
                            .await;
                    }
                } else {
                    entry.queue.push(QueuedNotification::StatusChange(result.status));
                    self.inner.items.write().remove(&entry.client_handle);
                }
            }
            Err(e) => {
                let status = match e {
                    OpcUaError::SessionInvalidated(s) | OpcUaError::Domain(s) => s,
                    _ => StatusCode::BAD_INTERNAL_ERROR,
                };
                entry.queue.push(QueuedNotification::StatusChange(status));
                self.inner.items.write().remove(&entry.client_handle);
            }
            Ok(_) => {
                entry
                    .queue
                    .push(QueuedNotification::StatusChange(StatusCode::BAD_INTERNAL_ERROR));
                self.inner.items.write().remove(&entry.client_handle);
            }
        }
    }

    /// Append `seq` to the pending-ack queue. Called exactly once per
    /// non-keep-alive Publish response, so every sequence number is
    /// acknowledged exactly once.
    pub(crate) fn queue_ack(&self, seq: u32) {
        self.inner.pending_acks.lock().push_back(seq);
    }

    /// Drain up to `max` pending acks, FIFO, for inclusion in the next
    /// outgoing Publish request.
    pub(crate) fn drain_acks(&self, max: usize) -> Vec<u32> {
        let mut acks = self.inner.pending_acks.lock();
        let take = max.min(acks.len());
        acks.drain(..take).collect()
    }

    /// Feed one Publish response's envelope through the reorder buffer,
    /// returning every envelope (including `envelope` itself) that is now
    /// ready to deliver, in ascending sequence order.
    pub(crate) fn accept(&self, envelope: PublishEnvelope) -> Vec<PublishEnvelope> {
        let mut state = self.inner.reorder.lock();
        state.buffer.insert(envelope.sequence_number, envelope);
        let mut ready = Vec::new();
        loop {
            let Some(&smallest) = state.buffer.keys().next() else {
                break;
            };
            let accept_now = match state.next_expected {
                None => true,
                Some(expected) => smallest == expected,
            };
            if !accept_now {
                break;
            }
            let envelope = state.buffer.remove(&smallest).expect("key just observed");
            state.next_expected = Some(smallest.wrapping_add(1));
            ready.push(envelope);
        }
        ready
    }

    /// Dispatch one in-order envelope to its MonitoredItems' handlers.
    ///
    /// Only `Reporting` items notify; `Sampling` items still update their
    /// latest-value cache (so a later mode switch to `Reporting` has
    /// somewhere to read from) but emit nothing, and `Disabled` items emit
    /// nothing at all. Real servers stop publishing for non-Reporting items
    /// on their own, but the client enforces this locally too rather than
    /// trusting that every server does.
    pub(crate) fn deliver(&self, envelope: PublishEnvelope) {
        let items = self.inner.items.read();
        for (client_handle, data_value) in envelope.data_change {
            if let Some(entry) = items.get(&client_handle) {
                entry.set_last_value(data_value.clone());
                if entry.state.read().monitoring_mode == MonitoringMode::Reporting {
                    let variant = data_value.value.clone().unwrap_or(Variant::Empty);
                    entry.queue.push(QueuedNotification::DataChange {
                        node_id: entry.target.clone(),
                        value: variant,
                        data_value,
                    });
                }
            }
        }
        for (client_handle, fields) in envelope.events {
            if let Some(entry) = items.get(&client_handle) {
                if entry.state.read().monitoring_mode == MonitoringMode::Reporting {
                    entry.queue.push(QueuedNotification::Event(EventFields(fields)));
                }
            }
        }
        if let Some(status) = envelope.status_change {
            for entry in items.values() {
                entry.queue.push(QueuedNotification::StatusChange(status));
            }
        }
    }
}
