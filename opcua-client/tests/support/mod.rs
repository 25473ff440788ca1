// SPDX-License-Identifier: MPL-2.0

//! An in-memory fake server standing in for a real OPC UA Transport, so the
//! Session/Subscription/Recovery logic in this crate can be exercised without
//! a wire protocol. Tests drive it by pushing notifications onto its publish
//! queue and by calling `drop_link` to simulate a dropped connection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use opcua_core::error::OpcUaError;
use opcua_core::transport::{
    Channel, MonitoredItemCreateParams, MonitoredItemResult, MonitoringFilter, SecurityOptions,
    ServiceRequest, ServiceResponse, Transport,
};
use opcua_types::{AttributeId, DataValue, NodeId, StatusCode};

/// One server-side subscription tracked by the fake server.
struct FakeSubscription {
    publishing_enabled: bool,
    items: std::collections::HashMap<u32, MonitoredItemCreateParams>,
}

/// A single notification batch queued for delivery on the next successful Publish.
pub enum Pending {
    DataChange {
        subscription_id: u32,
        client_handle: u32,
        value: opcua_types::Variant,
    },
    SubscriptionError {
        status: StatusCode,
    },
}

#[derive(Default)]
struct State {
    subscriptions: std::collections::HashMap<u32, FakeSubscription>,
    pending: VecDeque<Pending>,
    /// One-shot: the next Publish returns this error instead of a normal response.
    next_publish_error: Option<StatusCode>,
    modify_subscription_unsupported: bool,
    recreate_count: u32,
    /// The filter carried by the most recent `CreateMonitoredItems` or
    /// `ModifyMonitoredItems` call, for tests asserting tri-state filter updates.
    last_item_filter: Option<MonitoringFilter>,
    /// Node/attribute address space backing Read and Write, so the two
    /// actually round-trip instead of Read always returning a constant.
    address_space: std::collections::HashMap<(NodeId, AttributeId), DataValue>,
}

/// A fake OPC UA server/Transport pair used to drive the client core end to end.
pub struct FakeTransport {
    state: Mutex<State>,
    alive: AtomicBool,
    /// Counts down on every `request()` call while non-zero, failing each one.
    /// Does not affect `open`, so a reconnect attempt made while this is still
    /// counting down (or right after it reaches zero) succeeds immediately.
    fail_next_requests: AtomicU32,
    next_sub_id: AtomicU32,
    next_item_id: AtomicU32,
    next_sequence_number: AtomicU32,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            alive: AtomicBool::new(true),
            fail_next_requests: AtomicU32::new(0),
            next_sub_id: AtomicU32::new(1),
            next_item_id: AtomicU32::new(1),
            next_sequence_number: AtomicU32::new(1),
        })
    }

    /// Simulate a single link drop: the next `count` requests on the current
    /// channel fail with a transport error, and server-side subscription
    /// state is forgotten (mirroring a real server dropping its session along
    /// with the connection). A reconnect (`open`) is unaffected and succeeds.
    pub fn drop_link(&self, count: u32) {
        self.fail_next_requests.store(count, Ordering::SeqCst);
        self.state.lock().subscriptions.clear();
    }

    /// Queue a data-change notification for `client_handle` on `subscription_id`,
    /// delivered on the next Publish response.
    pub fn push_data_change(&self, subscription_id: u32, client_handle: u32, value: i32) {
        self.state.lock().pending.push_back(Pending::DataChange {
            subscription_id,
            client_handle,
            value: opcua_types::Variant::Int32(value),
        });
    }

    /// Arrange for the next Publish response to carry this error instead.
    pub fn fail_next_publish(&self, status: StatusCode) {
        self.state.lock().next_publish_error = Some(status);
    }

    /// From the next `ModifySubscription` onward, respond `BadServiceUnsupported`.
    pub fn refuse_modify_subscription(&self) {
        self.state.lock().modify_subscription_unsupported = true;
    }

    /// Number of `CreateSubscription` calls this server has served (1 for the
    /// original create, 2+ once Recovery re-creates it).
    pub fn subscription_create_count(&self) -> u32 {
        self.state.lock().recreate_count
    }

    /// The filter carried by the most recent `CreateMonitoredItems` or
    /// `ModifyMonitoredItems` call received, as the server saw it on the wire.
    pub fn last_item_filter(&self) -> Option<MonitoringFilter> {
        self.state.lock().last_item_filter.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&self, _url: &str, _security: &SecurityOptions) -> Result<Channel, OpcUaError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(OpcUaError::Transport("fake server unreachable".to_string()));
        }
        Ok(Channel(1))
    }

    async fn close(&self, _channel: &Channel) {}

    async fn request(
        &self,
        _channel: &Channel,
        request: ServiceRequest,
    ) -> Result<ServiceResponse, OpcUaError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(OpcUaError::Transport("fake server unreachable".to_string()));
        }
        if self
            .fail_next_requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n > 0 {
                    Some(n - 1)
                } else {
                    None
                }
            })
            .is_ok()
        {
            return Err(OpcUaError::Transport("fake link dropped".to_string()));
        }

        match request {
            ServiceRequest::GetEndpoints => Ok(ServiceResponse::GetEndpoints {
                endpoints: vec!["opc.tcp://fake:4840".into()],
            }),
            ServiceRequest::Read { nodes_to_read, .. } => {
                let state = self.state.lock();
                Ok(ServiceResponse::Read {
                    results: nodes_to_read
                        .iter()
                        .map(|rvi| {
                            state
                                .address_space
                                .get(&(rvi.node_id.clone(), rvi.attribute_id))
                                .cloned()
                                .unwrap_or_else(|| {
                                    opcua_types::DataValue::new_now(opcua_types::Variant::Int32(0))
                                })
                        })
                        .collect(),
                })
            }
            ServiceRequest::Write { nodes_to_write } => {
                let mut state = self.state.lock();
                let results = nodes_to_write
                    .iter()
                    .map(|(rvi, value)| {
                        state.address_space.insert(
                            (rvi.node_id.clone(), rvi.attribute_id),
                            value.clone(),
                        );
                        StatusCode::GOOD
                    })
                    .collect();
                Ok(ServiceResponse::Write { results })
            }
            ServiceRequest::Browse { .. } => Ok(ServiceResponse::Browse { references: vec![] }),
            ServiceRequest::Call { .. } => Ok(ServiceResponse::Call {
                status: StatusCode::GOOD,
                output_arguments: vec![],
            }),
            ServiceRequest::CreateSubscription {
                requested_publishing_interval_ms,
                requested_lifetime_count,
                requested_max_keep_alive_count,
                requested_max_notifications_per_publish,
                publishing_enabled,
                ..
            } => {
                let id = self.next_sub_id.fetch_add(1, Ordering::SeqCst);
                let mut state = self.state.lock();
                state.recreate_count += 1;
                state.subscriptions.insert(
                    id,
                    FakeSubscription {
                        publishing_enabled,
                        items: std::collections::HashMap::new(),
                    },
                );
                Ok(ServiceResponse::CreateSubscription {
                    subscription_id: id,
                    revised_publishing_interval_ms: requested_publishing_interval_ms.max(50.0),
                    revised_lifetime_count: requested_lifetime_count,
                    revised_max_keep_alive_count: requested_max_keep_alive_count,
                    revised_max_notifications_per_publish: requested_max_notifications_per_publish,
                })
            }
            ServiceRequest::ModifySubscription {
                requested_publishing_interval_ms,
                requested_lifetime_count,
                requested_max_keep_alive_count,
                requested_max_notifications_per_publish,
                ..
            } => {
                if self.state.lock().modify_subscription_unsupported {
                    return Err(OpcUaError::Domain(StatusCode::BAD_SERVICE_UNSUPPORTED));
                }
                Ok(ServiceResponse::ModifySubscription {
                    revised_publishing_interval_ms: requested_publishing_interval_ms,
                    revised_lifetime_count: requested_lifetime_count,
                    revised_max_keep_alive_count: requested_max_keep_alive_count,
                    revised_max_notifications_per_publish: requested_max_notifications_per_publish,
                })
            }
            ServiceRequest::DeleteSubscriptions { subscription_ids } => {
                let mut state = self.state.lock();
                for id in &subscription_ids {
                    state.subscriptions.remove(id);
                }
                Ok(ServiceResponse::DeleteSubscriptions {
                    results: subscription_ids.iter().map(|_| StatusCode::GOOD).collect(),
                })
            }
            ServiceRequest::SetPublishingMode {
                subscription_ids,
                publishing_enabled,
            } => {
                let mut state = self.state.lock();
                for id in &subscription_ids {
                    if let Some(sub) = state.subscriptions.get_mut(id) {
                        sub.publishing_enabled = publishing_enabled;
                    }
                }
                Ok(ServiceResponse::SetPublishingMode {
                    results: subscription_ids.iter().map(|_| StatusCode::GOOD).collect(),
                })
            }
            ServiceRequest::CreateMonitoredItems {
                subscription_id,
                items,
            } => {
                let mut state = self.state.lock();
                let Some(sub) = state.subscriptions.get_mut(&subscription_id) else {
                    return Err(OpcUaError::Domain(StatusCode::BAD_SUBSCRIPTION_ID_INVALID));
                };
                let mut results = Vec::with_capacity(items.len());
                let mut last_filter = None;
                for item in items {
                    let server_handle = self.next_item_id.fetch_add(1, Ordering::SeqCst);
                    results.push(MonitoredItemResult {
                        status: StatusCode::GOOD,
                        monitored_item_id: server_handle,
                        revised_sampling_interval_ms: item.sampling_interval_ms.max(50.0),
                        revised_queue_size: item.queue_size.max(1),
                    });
                    last_filter = Some(item.filter.clone());
                    sub.items.insert(server_handle, item);
                }
                state.last_item_filter = last_filter;
                Ok(ServiceResponse::CreateMonitoredItems { results })
            }
            ServiceRequest::ModifyMonitoredItems {
                subscription_id,
                items,
            } => {
                let mut state = self.state.lock();
                let Some(sub) = state.subscriptions.get_mut(&subscription_id) else {
                    return Err(OpcUaError::Domain(StatusCode::BAD_SUBSCRIPTION_ID_INVALID));
                };
                let mut results = Vec::with_capacity(items.len());
                let mut last_filter = None;
                for (server_handle, params) in items {
                    results.push(MonitoredItemResult {
                        status: StatusCode::GOOD,
                        monitored_item_id: server_handle,
                        revised_sampling_interval_ms: params.sampling_interval_ms.max(50.0),
                        revised_queue_size: params.queue_size.max(1),
                    });
                    last_filter = Some(params.filter.clone());
                    sub.items.insert(server_handle, params);
                }
                state.last_item_filter = last_filter;
                Ok(ServiceResponse::ModifyMonitoredItems { results })
            }
            ServiceRequest::DeleteMonitoredItems {
                subscription_id,
                monitored_item_ids,
            } => {
                let mut state = self.state.lock();
                if let Some(sub) = state.subscriptions.get_mut(&subscription_id) {
                    for id in &monitored_item_ids {
                        sub.items.remove(id);
                    }
                }
                Ok(ServiceResponse::DeleteMonitoredItems {
                    results: monitored_item_ids.iter().map(|_| StatusCode::GOOD).collect(),
                })
            }
            ServiceRequest::SetMonitoringMode {
                monitored_item_ids, ..
            } => Ok(ServiceResponse::SetMonitoringMode {
                results: monitored_item_ids.iter().map(|_| StatusCode::GOOD).collect(),
            }),
            ServiceRequest::Publish { .. } => {
                if let Some(status) = self.state.lock().next_publish_error.take() {
                    return Err(OpcUaError::Domain(status));
                }
                let next = self.state.lock().pending.pop_front();
                match next {
                    None => {
                        // No data queued: behave like a long-poll that would
                        // otherwise block. Yield briefly so callers don't spin.
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Err(OpcUaError::Timeout)
                    }
                    Some(Pending::DataChange {
                        subscription_id,
                        client_handle,
                        value,
                    }) => {
                        let sequence_number = self.next_sequence_number.fetch_add(1, Ordering::SeqCst);
                        Ok(ServiceResponse::Publish {
                            subscription_id,
                            sequence_number,
                            more_notifications: false,
                            data_change_notifications: vec![(
                                client_handle,
                                opcua_types::DataValue::new_now(value),
                            )],
                            event_notifications: vec![],
                            status_change: None,
                            available_sequence_numbers: vec![],
                        })
                    }
                    Some(Pending::SubscriptionError { status }) => {
                        Err(OpcUaError::Domain(status))
                    }
                }
            }
        }
    }

    fn is_alive(&self, _channel: &Channel) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}
