// SPDX-License-Identifier: MPL-2.0

//! Reconnection behavior, driven against [`support::FakeTransport`]: a
//! dropped link must be reconnected and every live subscription and
//! MonitoredItem recreated underneath the same client-visible identities.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use opcua_client::{ConnectOptions, DataChangeCallback, MonitoredItemSpec, Session, SubscriptionParams};
use opcua_core::config::ClientConfig;
use opcua_types::NodeId;

use support::FakeTransport;

fn fast_config() -> ClientConfig {
    ClientConfig {
        keep_alive_interval_ms: 30,
        request_timeout_ms: 2_000,
        ..ClientConfig::default()
    }
}

async fn connect(transport: Arc<FakeTransport>) -> Session {
    Session::connect(
        transport,
        "opc.tcp://fake:4840",
        ConnectOptions::default(),
        fast_config(),
    )
    .await
    .expect("connect to fake server")
}

async fn wait_for_len(received: &Mutex<Vec<i32>>, len: usize, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if received.lock().unwrap().len() >= len {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for notifications");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn wait_for_recreate(transport: &FakeTransport, count: u32, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if transport.subscription_create_count() >= count {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for subscription recreate");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// A single dropped request is enough to trigger Recovery, which reconnects
/// and recreates the live subscription and its MonitoredItem under the same
/// client-assigned handle, without the caller noticing anything beyond a
/// brief gap in delivery.
#[tokio::test]
async fn dropped_link_is_recovered_preserving_client_handle() {
    let transport = FakeTransport::new();
    let session = connect(transport.clone()).await;

    let key = session
        .subscriptions()
        .create_subscription(
            &session,
            SubscriptionParams {
                publishing_interval_ms: 50.0,
                ..SubscriptionParams::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(transport.subscription_create_count(), 1);

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    let handler = Arc::new(DataChangeCallback::new(move |_node, value, _dv| {
        if let opcua_types::Variant::Int32(v) = value {
            received_clone.lock().unwrap().push(v);
        }
    }));
    let client_handle = session
        .subscriptions()
        .add_monitored_item(
            &session,
            key,
            MonitoredItemSpec::value(
                NodeId::new(2u16, "Counter"),
                100.0,
                handler as Arc<dyn opcua_client::NotificationSink>,
            ),
        )
        .await
        .unwrap();

    transport.push_data_change(1, client_handle, 1);
    wait_for_len(&received, 1, Duration::from_secs(2)).await;

    // Drop the next request: whichever of keep-alive or Publish hits it
    // first, the resulting transport error must trigger Recovery.
    transport.drop_link(1);
    wait_for_recreate(&transport, 2, Duration::from_secs(5)).await;

    // The recreated subscription got a fresh server-assigned id (2), but the
    // client-assigned MonitoredItem handle must be unchanged.
    transport.push_data_change(2, client_handle, 2);
    wait_for_len(&received, 2, Duration::from_secs(2)).await;

    assert_eq!(*received.lock().unwrap(), vec![1, 2]);

    // The subscription's own identity (the key callers hold) never changes
    // across a recreate; confirm it is still valid against the registry.
    let summaries = session.subscriptions().list();
    assert!(summaries.iter().any(|s| s.key == key));

    session.close().await.unwrap();
}

/// A session with no live subscriptions simply reconnects; there is nothing
/// for Recovery to recreate.
#[tokio::test]
async fn recovery_without_subscriptions_just_reconnects() {
    let transport = FakeTransport::new();
    let session = connect(transport.clone()).await;

    transport.drop_link(1);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // The session must still be usable: a fresh subscription can be created
    // after the keep-alive path recovers the channel.
    let key = session
        .subscriptions()
        .create_subscription(&session, SubscriptionParams::default())
        .await
        .unwrap();
    let summaries = session.subscriptions().list();
    assert!(summaries.iter().any(|s| s.key == key));

    session.close().await.unwrap();
}
