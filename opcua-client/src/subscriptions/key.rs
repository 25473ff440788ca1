// SPDX-License-Identifier: MPL-2.0

//! [`SubscriptionKey`] - the client-generated identity that survives Recovery.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stable, client-generated identity for a subscription.
///
/// Unlike the server-assigned subscription id (which changes every time
/// [`super::Subscription::recreate`] runs), a `SubscriptionKey` is generated
/// once, when [`super::SubscriptionRegistry::create`] is called, and never
/// changes for the lifetime of the registry entry. User code holds onto
/// `SubscriptionKey`s, not server ids.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct SubscriptionKey(u64);

impl fmt::Debug for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionKey({})", self.0)
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

static NEXT_SUBSCRIPTION_KEY: AtomicU64 = AtomicU64::new(1);

impl SubscriptionKey {
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// A client-generated identity for a MonitoredItem, stable across Recovery.
///
/// Assigned monotonically per Subscription by
/// [`super::Subscription::add_monitored_item`]; never reused, even after the
/// item it named has been removed.
pub type ClientHandle = u32;
