// SPDX-License-Identifier: MPL-2.0

//! [`SubscriptionRegistry`] - the Session-owned collection of live
//! Subscriptions, and the lazily spawned session-wide Publish pump that
//! drives all of them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::sync::Notify;

use opcua_core::error::OpcUaError;

use crate::session::Session;
use crate::subscriptions::dispatch::DispatchPool;
use crate::subscriptions::key::{ClientHandle, SubscriptionKey};
use crate::subscriptions::params::{
    FilterUpdate, ModifyOutcome, MonitoredItemSpec, SubscriptionParams, SubscriptionSummary,
};
use crate::subscriptions::pump;
use crate::subscriptions::subscription::{publish_request_share, Subscription};
use opcua_types::{DataValue, MonitoringMode};

/// Absolute cap on outstanding Publish requests, regardless of how many
/// subscriptions or how short their publishing intervals are.
pub(crate) const MAX_OUTSTANDING_PUBLISH_REQUESTS: usize = 10;

/// Owns every live [`Subscription`] on a [`Session`], indexed both by the
/// client-generated [`SubscriptionKey`] callers hold and by the
/// server-assigned subscription id the Publish pump needs to route
/// responses. Also owns the lazily spawned Publish pump task itself: it
/// starts the moment the first subscription is created and stops once the
/// last one is deleted or the session closes.
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    subscriptions: RwLock<HashMap<SubscriptionKey, Subscription>>,
    by_server_id: RwLock<HashMap<u32, SubscriptionKey>>,
    dispatch_pool: Arc<DispatchPool>,
    pump_handle: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
    pump_cancel: Notify,
    backpressure_penalty: AtomicUsize,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                subscriptions: RwLock::new(HashMap::new()),
                by_server_id: RwLock::new(HashMap::new()),
                dispatch_pool: Arc::new(DispatchPool::new(
                    crate::subscriptions::dispatch::DEFAULT_DISPATCH_WORKERS,
                )),
                pump_handle: parking_lot::Mutex::new(None),
                pump_cancel: Notify::new(),
                backpressure_penalty: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a new subscription with `params`, starting the session-wide
    /// Publish pump if this is the first live subscription on the session.
    pub async fn create_subscription(
        &self,
        session: &Session,
        params: SubscriptionParams,
    ) -> Result<SubscriptionKey, OpcUaError> {
        session.ensure_activated().await?;
        let subscription =
            Subscription::create(session, params, self.inner.dispatch_pool.clone()).await?;
        let key = subscription.key();
        let server_id = subscription.server_id();
        let was_empty = self.inner.subscriptions.read().is_empty();
        self.inner.subscriptions.write().insert(key, subscription);
        self.inner.by_server_id.write().insert(server_id, key);
        if was_empty {
            self.spawn_pump(session.clone());
        }
        Ok(key)
    }

    /// Modify the timing parameters of an existing subscription.
    pub async fn modify_subscription(
        &self,
        session: &Session,
        key: SubscriptionKey,
        params: SubscriptionParams,
    ) -> Result<ModifyOutcome, OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription.modify(session, params).await
    }

    /// Delete a subscription and every MonitoredItem it owns. A second call
    /// with the same `key` returns `OpcUaError::Usage` since the registry no
    /// longer knows about it.
    pub async fn delete_subscription(
        &self,
        session: &Session,
        key: SubscriptionKey,
    ) -> Result<(), OpcUaError> {
        session.ensure_activated().await?;
        let subscription = {
            let mut subscriptions = self.inner.subscriptions.write();
            subscriptions
                .remove(&key)
                .ok_or_else(|| OpcUaError::Usage(format!("unknown subscription key {key}")))?
        };
        self.inner
            .by_server_id
            .write()
            .remove(&subscription.server_id());
        subscription.delete(session).await?;
        if self.inner.subscriptions.read().is_empty() {
            self.inner.pump_cancel.notify_waiters();
        }
        Ok(())
    }

    /// Toggle whether a subscription's MonitoredItems report data. Does not
    /// stop the Publish pump or affect keep-alive.
    pub async fn set_publishing_mode(
        &self,
        session: &Session,
        key: SubscriptionKey,
        enabled: bool,
    ) -> Result<(), OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription.set_publishing_mode(session, enabled).await
    }

    /// Add a MonitoredItem to a subscription, returning its client-assigned handle.
    pub async fn add_monitored_item(
        &self,
        session: &Session,
        key: SubscriptionKey,
        spec: MonitoredItemSpec,
    ) -> Result<ClientHandle, OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription.add_monitored_item(session, spec).await
    }

    /// Remove a MonitoredItem from a subscription.
    pub async fn remove_monitored_item(
        &self,
        session: &Session,
        key: SubscriptionKey,
        client_handle: ClientHandle,
    ) -> Result<(), OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription.remove_monitored_item(session, client_handle).await
    }

    /// Modify a MonitoredItem's sampling interval, queue size, and (per
    /// `new_filter`'s tri-state) filter.
    pub async fn modify_monitored_item(
        &self,
        session: &Session,
        key: SubscriptionKey,
        client_handle: ClientHandle,
        new_sampling_interval_ms: f64,
        new_queue_size: u32,
        new_filter: FilterUpdate,
    ) -> Result<(), OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription
            .modify_monitored_item(
                session,
                client_handle,
                new_sampling_interval_ms,
                new_queue_size,
                new_filter,
            )
            .await
    }

    /// Change the monitoring mode of one or more MonitoredItems belonging to the same subscription.
    pub async fn set_monitoring_mode(
        &self,
        session: &Session,
        key: SubscriptionKey,
        client_handles: &[ClientHandle],
        mode: MonitoringMode,
    ) -> Result<(), OpcUaError> {
        session.ensure_activated().await?;
        let subscription = self.get(key)?;
        subscription.set_monitoring_mode(session, client_handles, mode).await
    }

    /// The latest value observed for a MonitoredItem, regardless of its
    /// monitoring mode. `None` if the key or handle is unknown, or nothing
    /// has been delivered yet.
    pub fn last_value(&self, key: SubscriptionKey, client_handle: ClientHandle) -> Option<DataValue> {
        self.get(key).ok()?.last_value(client_handle)
    }

    /// Snapshot of every live subscription's key, revised parameters and item count.
    pub fn list(&self) -> Vec<SubscriptionSummary> {
        self.inner
            .subscriptions
            .read()
            .values()
            .map(|s| SubscriptionSummary {
                key: s.key(),
                revised: s.revised(),
                item_count: s.item_count(),
            })
            .collect()
    }

    fn get(&self, key: SubscriptionKey) -> Result<Subscription, OpcUaError> {
        self.inner
            .subscriptions
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| OpcUaError::Usage(format!("unknown subscription key {key}")))
    }

    /// All live subscriptions, for Recovery to re-create in sequence.
    pub(crate) fn snapshot(&self) -> Vec<Subscription> {
        self.inner.subscriptions.read().values().cloned().collect()
    }

    /// Delete every live subscription, best-effort, e.g. as part of `Session::close`.
    pub(crate) async fn delete_all(&self, session: &Session) {
        let subscriptions: Vec<Subscription> =
            self.inner.subscriptions.write().drain().map(|(_, s)| s).collect();
        self.inner.by_server_id.write().clear();
        self.inner.pump_cancel.notify_waiters();
        for subscription in subscriptions {
            if let Err(e) = subscription.delete(session).await {
                log::warn!("failed to delete subscription {} during close: {e}", subscription.key());
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.subscriptions.read().is_empty()
    }

    pub(crate) fn find_by_server_id(&self, server_id: u32) -> Option<Subscription> {
        let key = *self.inner.by_server_id.read().get(&server_id)?;
        self.inner.subscriptions.read().get(&key).cloned()
    }

    /// Re-index `subscription` under its current server id. Recovery changes
    /// a subscription's server id without going through `create_subscription`,
    /// so the by-server-id index must be refreshed separately.
    pub(crate) fn reindex(&self, subscription: &Subscription) {
        let mut by_server_id = self.inner.by_server_id.write();
        by_server_id.retain(|_, key| *key != subscription.key());
        by_server_id.insert(subscription.server_id(), subscription.key());
    }

    /// Sum of every live subscription's Publish-request share, minus any
    /// accumulated backpressure penalty, bounded to at least 1 and at most
    /// [`MAX_OUTSTANDING_PUBLISH_REQUESTS`].
    pub(crate) fn target_outstanding(&self) -> usize {
        let aggregate: usize = self
            .inner
            .subscriptions
            .read()
            .values()
            .map(|s| publish_request_share(s.revised()))
            .sum();
        let penalty = self.inner.backpressure_penalty.load(Ordering::Relaxed);
        aggregate.min(MAX_OUTSTANDING_PUBLISH_REQUESTS).saturating_sub(penalty).max(1)
    }

    /// Record a `BadTooManyPublishRequests` signal from the server, shrinking
    /// the effective outstanding target. Does not currently decay; a session
    /// that hits this once keeps fewer requests outstanding for its lifetime.
    pub(crate) fn reduce_target(&self) {
        self.inner.backpressure_penalty.fetch_add(1, Ordering::Relaxed);
    }

    /// Drain up to `budget` pending acks total, spread across every live
    /// subscription, paired with the subscription's current server id.
    pub(crate) fn drain_all_acks(&self, budget: usize) -> Vec<(u32, u32)> {
        let mut acks = Vec::new();
        for subscription in self.inner.subscriptions.read().values() {
            if acks.len() >= budget {
                break;
            }
            let server_id = subscription.server_id();
            for seq in subscription.drain_acks(budget - acks.len()) {
                acks.push((server_id, seq));
            }
        }
        acks
    }

    pub(crate) async fn pump_cancel_notified(&self) {
        self.inner.pump_cancel.notified().await
    }

    fn spawn_pump(&self, session: Session) {
        let mut handle = self.inner.pump_handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        *handle = Some(pump::spawn(session));
    }
}
