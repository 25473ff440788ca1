// SPDX-License-Identifier: MPL-2.0

//! Handler dispatch, off the Publish pump's critical path.
//!
//! Each MonitoredItem gets its own FIFO queue of pending notifications; a
//! fixed-size, session-wide pool caps how many of those queues are actively
//! being drained (i.e. how many handler invocations run concurrently) at
//! once. A queue with no active drainer and a pending notification spawns a
//! short-lived task that holds one pool permit and drains the queue to
//! empty, preserving this item's delivery order without ever holding a
//! Subscription or Registry lock while the handler runs.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use opcua_types::{DataValue, NodeId, StatusCode, Variant};

use crate::subscriptions::notification::{EventFields, NotificationSink};

/// One notification queued for delivery to a single MonitoredItem's handler.
pub(crate) enum QueuedNotification {
    DataChange {
        node_id: NodeId,
        value: Variant,
        data_value: DataValue,
    },
    Event(EventFields),
    StatusChange(StatusCode),
}

/// The bounded pool handler dispatch runs on. Default size matches the
/// spec's default of 4 concurrent handler invocations per Session.
pub(crate) struct DispatchPool {
    semaphore: Arc<Semaphore>,
}

pub(crate) const DEFAULT_DISPATCH_WORKERS: usize = 4;

impl DispatchPool {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Create a FIFO queue for one MonitoredItem's notifications, bound to
    /// this pool's concurrency limit.
    pub(crate) fn item_queue(&self, handler: Arc<dyn NotificationSink>) -> ItemQueue {
        ItemQueue {
            state: Arc::new(ItemQueueState {
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                handler,
            }),
            semaphore: self.semaphore.clone(),
        }
    }
}

struct ItemQueueState {
    pending: Mutex<VecDeque<QueuedNotification>>,
    draining: AtomicBool,
    handler: Arc<dyn NotificationSink>,
}

/// A single MonitoredItem's FIFO dispatch queue.
#[derive(Clone)]
pub(crate) struct ItemQueue {
    state: Arc<ItemQueueState>,
    semaphore: Arc<Semaphore>,
}

impl ItemQueue {
    /// Enqueue a notification for delivery, spawning a drain task if one
    /// isn't already running for this item.
    pub(crate) fn push(&self, notification: QueuedNotification) {
        self.state.pending.lock().push_back(notification);
        self.ensure_draining();
    }

    fn ensure_draining(&self) {
        if self.state.draining.swap(true, Ordering::AcqRel) {
            // A drain task is already running (or about to notice the
            // notification we just pushed); nothing more to do.
            return;
        }
        let state = self.state.clone();
        let semaphore = self.semaphore.clone();
        tokio::task::spawn(async move {
            loop {
                let next = state.pending.lock().pop_front();
                let Some(notification) = next else {
                    // Nothing left; stop claiming to drain, but re-check once
                    // more in case a push raced us between the pop above and
                    // here.
                    state.draining.store(false, Ordering::Release);
                    if state.pending.lock().is_empty() {
                        break;
                    }
                    if state.draining.swap(true, Ordering::AcqRel) {
                        break;
                    }
                    continue;
                };
                let Ok(_permit) = semaphore.acquire().await else {
                    break;
                };
                deliver(&state.handler, notification);
            }
        });
    }
}

/// Invoke `handler` for `notification`, catching and logging a panic instead
/// of letting it unwind into the dispatch pool's task (which would otherwise
/// silently stop delivering to every item sharing that pool slot).
fn deliver(handler: &Arc<dyn NotificationSink>, notification: QueuedNotification) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| match notification {
        QueuedNotification::DataChange {
            node_id,
            value,
            data_value,
        } => handler.on_data_change(&node_id, &value, &data_value),
        QueuedNotification::Event(fields) => handler.on_event(&fields),
        QueuedNotification::StatusChange(status) => handler.on_status_change(status),
    }));
    if let Err(panic) = result {
        let message = panic
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        log::error!("notification handler panicked, discarding: {message}");
    }
}
