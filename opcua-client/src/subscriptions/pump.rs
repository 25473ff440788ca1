// SPDX-License-Identifier: MPL-2.0

//! The session-wide Publish pump.
//!
//! OPC UA's `Publish` service is not addressed to a particular subscription:
//! a single outstanding Publish request can be answered with notifications
//! for whichever subscription the server chooses next, and its
//! acknowledgement list can span several subscriptions at once. The pump
//! therefore runs once per [`crate::session::Session`], not once per
//! Subscription: it keeps `target_outstanding` requests in flight, drains
//! pending acks across every live subscription into each outgoing request,
//! and routes each response to the [`crate::subscriptions::Subscription`]
//! named by its `subscription_id` once the response arrives.

use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use opcua_core::error::OpcUaError;
use opcua_core::transport::{ServiceRequest, ServiceResponse};
use opcua_types::StatusCode;

use crate::session::Session;
use crate::subscriptions::subscription::PublishEnvelope;

/// How many pending acks one outgoing Publish request carries at most.
const ACK_BATCH: usize = 64;

/// Publish requests are long-lived; a generous deadline avoids tearing one
/// down (and losing its place in the server's queue) just because nothing
/// had arrived yet.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(120);

/// Short delay after observing `BadTooManyPublishRequests`, giving the
/// server's own backlog a moment to drain before trying again.
const BACKPRESSURE_COOLDOWN: Duration = Duration::from_millis(200);

pub(crate) fn spawn(session: Session) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move { run(session).await })
}

async fn run(session: Session) {
    let mut in_flight = FuturesUnordered::new();
    loop {
        let registry = session.subscriptions();
        if session.state().is_terminal() || registry.is_empty() {
            break;
        }

        let target = registry.target_outstanding();
        while in_flight.len() < target {
            in_flight.push(do_publish(session.clone()));
        }

        tokio::select! {
            _ = registry.pump_cancel_notified() => break,
            result = in_flight.next(), if !in_flight.is_empty() => {
                if let Some(result) = result {
                    handle_publish_result(&session, result).await;
                }
            }
        }
    }
}

async fn do_publish(session: Session) -> Result<ServiceResponse, OpcUaError> {
    let acks = session.subscriptions().drain_all_acks(ACK_BATCH);
    let request = ServiceRequest::Publish {
        subscription_acknowledgements: acks,
    };
    session.send_raw(request, PUBLISH_TIMEOUT).await
}

async fn handle_publish_result(session: &Session, result: Result<ServiceResponse, OpcUaError>) {
    match result {
        Ok(ServiceResponse::Publish {
            subscription_id,
            sequence_number,
            more_notifications: _,
            data_change_notifications,
            event_notifications,
            status_change,
            available_sequence_numbers: _,
        }) => {
            let Some(subscription) = session.subscriptions().find_by_server_id(subscription_id) else {
                log::debug!(
                    "session:{} publish response for unknown subscription {subscription_id}, dropping",
                    session.id()
                );
                return;
            };
            let is_keep_alive = data_change_notifications.is_empty()
                && event_notifications.is_empty()
                && status_change.is_none();
            if is_keep_alive {
                return;
            }
            subscription.queue_ack(sequence_number);
            let envelope = PublishEnvelope {
                sequence_number,
                data_change: data_change_notifications,
                events: event_notifications,
                status_change,
            };
            for ready in subscription.accept(envelope) {
                subscription.deliver(ready);
            }
        }
        Ok(_) => {
            log::error!("session:{} unexpected response to Publish", session.id());
        }
        Err(e) => handle_publish_error(session, e).await,
    }
}

async fn handle_publish_error(session: &Session, err: OpcUaError) {
    let bits = match &err {
        OpcUaError::Domain(s) | OpcUaError::SessionInvalidated(s) => Some(s.bits()),
        _ => None,
    };

    if bits == Some(StatusCode::BAD_TOO_MANY_PUBLISH_REQUESTS.bits()) {
        log::warn!(
            "session:{} server reports too many outstanding publish requests; reducing target",
            session.id()
        );
        session.subscriptions().reduce_target();
        tokio::time::sleep(BACKPRESSURE_COOLDOWN).await;
        return;
    }

    if bits == Some(StatusCode::BAD_SUBSCRIPTION_ID_INVALID.bits()) {
        // The failed Publish request's ack batch may have spanned several
        // subscriptions, so which one the server rejected can't be
        // recovered from the error alone. Recreating every live
        // subscription is conservative but correct: an already-valid
        // subscription recreating is a harmless no-op from the caller's
        // perspective (its key and MonitoredItem handles are unchanged).
        log::warn!(
            "session:{} a subscription id was rejected by the server; recreating all live subscriptions",
            session.id()
        );
        for subscription in session.subscriptions().snapshot() {
            match subscription.recreate(session).await {
                Ok(()) => session.subscriptions().reindex(&subscription),
                Err(e) => log::error!(
                    "session:{} failed to recreate subscription {}: {e}",
                    session.id(),
                    subscription.key()
                ),
            }
        }
        return;
    }

    if err.triggers_recovery() {
        if let Err(e) = crate::session::recovery::attempt(session).await {
            log::error!("session:{} recovery failed after publish error: {e}", session.id());
        }
        return;
    }

    log::warn!("session:{} publish request failed: {err}", session.id());
}
