// SPDX-License-Identifier: MPL-2.0

//! Subscriptions and MonitoredItems: the data-change/event delivery half of
//! the client core. A [`Session`](crate::session::Session) owns exactly one
//! [`SubscriptionRegistry`], which owns every [`Subscription`] created
//! against it and the session-wide Publish pump that keeps them fed.

mod dispatch;
mod key;
mod monitored_item;
mod notification;
mod params;
mod pump;
mod registry;
mod subscription;

pub use key::{ClientHandle, SubscriptionKey};
pub use notification::{Callbacks, DataChangeCallback, EventCallback, EventFields, NotificationSink};
pub use params::{
    FilterUpdate, ModifyOutcome, MonitoredItemSpec, MonitoringFilterSpec, SubscriptionParams,
    SubscriptionSummary, DEFAULT_EVENT_FIELDS,
};
pub use registry::SubscriptionRegistry;
pub use subscription::SubscriptionLifecycle;
