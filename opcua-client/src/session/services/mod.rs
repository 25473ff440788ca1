// SPDX-License-Identifier: MPL-2.0

//! The thin request/response service facades consumed by user code: Read,
//! Write, Browse, Call. Subscription-related services live under
//! [`crate::subscriptions`] since their lifecycle is considerably more
//! involved than a single round trip.

pub mod attributes;
pub mod method;
pub mod view;
