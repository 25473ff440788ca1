// SPDX-License-Identifier: MPL-2.0

//! End-to-end subscription behavior, driven against [`support::FakeTransport`]
//! instead of a real server.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use opcua_client::{
    ConnectOptions, DataChangeCallback, FilterUpdate, MonitoredItemSpec, MonitoringFilterSpec,
    Session, SubscriptionParams,
};
use opcua_core::config::ClientConfig;
use opcua_types::{DataChangeFilter, DeadbandType, NodeId, StatusCode};

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

/// A steady stream of DataChange notifications is delivered to the handler
/// in the order the server reports them.
#[tokio::test]
async fn happy_path_data_change_delivers_values_in_order() {
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
    assert_eq!(client_handle, 1);

    for v in [1, 2, 3, 4, 5] {
        transport.push_data_change(1, client_handle, v);
    }

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if received.lock().unwrap().len() == 5 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for notifications");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(*received.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    session.close().await.unwrap();
}

/// A server that refuses `ModifySubscription` still reports success,
/// with `server_refused_modify = true` and `revised` left unchanged.
#[tokio::test]
async fn modify_subscription_unsupported_keeps_revised_and_flags_refusal() {
    let transport = FakeTransport::new();
    let session = connect(transport.clone()).await;

    let key = session
        .subscriptions()
        .create_subscription(&session, SubscriptionParams::default())
        .await
        .unwrap();
    let before = session.subscriptions().list();
    let revised_before = before.iter().find(|s| s.key == key).unwrap().revised;

    transport.refuse_modify_subscription();

    let outcome = session
        .subscriptions()
        .modify_subscription(
            &session,
            key,
            SubscriptionParams {
                publishing_interval_ms: 9_999.0,
                ..SubscriptionParams::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.server_refused_modify);
    assert_eq!(outcome.revised, revised_before);

    session.close().await.unwrap();
}

/// A `BadTooManyPublishRequests` response is absorbed without dropping the
/// pump: it backs off briefly, then keeps delivering later notifications.
#[tokio::test]
async fn too_many_publish_requests_does_not_stall_the_pump() {
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
    wait_for_len(&received, 1).await;

    transport.fail_next_publish(StatusCode::BAD_TOO_MANY_PUBLISH_REQUESTS);
    transport.push_data_change(1, client_handle, 2);
    wait_for_len(&received, 2).await;

    assert_eq!(*received.lock().unwrap(), vec![1, 2]);
    session.close().await.unwrap();
}

async fn wait_for_len(received: &Mutex<Vec<i32>>, len: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if received.lock().unwrap().len() >= len {
            return;
        }
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for notifications");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Filter tri-state update: `Unset` must leave the wire-level filter
/// untouched, `Null` must clear it, and `New` must replace it.
#[tokio::test]
async fn filter_tri_state_update() {
    let transport = FakeTransport::new();
    let session = connect(transport.clone()).await;

    let key = session
        .subscriptions()
        .create_subscription(&session, SubscriptionParams::default())
        .await
        .unwrap();

    let handler: Arc<dyn opcua_client::NotificationSink> =
        Arc::new(DataChangeCallback::new(|_, _, _| {}));
    let initial_filter = MonitoringFilterSpec::DataChange(DataChangeFilter {
        deadband_type: DeadbandType::Absolute,
        deadband_value: 1.0,
    });
    let client_handle = session
        .subscriptions()
        .add_monitored_item(
            &session,
            key,
            MonitoredItemSpec {
                node_id: NodeId::new(2u16, "Temp"),
                attribute_id: opcua_types::AttributeId::Value,
                sampling_interval_ms: 100.0,
                queue_size: 1,
                discard_oldest: true,
                monitoring_mode: opcua_types::MonitoringMode::Reporting,
                filter: Some(initial_filter.clone()),
                handler: handler.clone(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        transport.last_item_filter(),
        Some(opcua_core::transport::MonitoringFilter::DataChange(DataChangeFilter {
            deadband_type: DeadbandType::Absolute,
            deadband_value: 1.0,
        }))
    );

    // unset: the server must see the same filter again, unchanged.
    session
        .subscriptions()
        .modify_monitored_item(&session, key, client_handle, 100.0, 1, FilterUpdate::Unset)
        .await
        .unwrap();
    assert_eq!(
        transport.last_item_filter(),
        Some(opcua_core::transport::MonitoringFilter::DataChange(DataChangeFilter {
            deadband_type: DeadbandType::Absolute,
            deadband_value: 1.0,
        }))
    );

    // null: the server must see the filter cleared.
    session
        .subscriptions()
        .modify_monitored_item(&session, key, client_handle, 100.0, 1, FilterUpdate::Null)
        .await
        .unwrap();
    assert_eq!(
        transport.last_item_filter(),
        Some(opcua_core::transport::MonitoringFilter::None)
    );

    // new: the server must see the replacement filter.
    let replacement = MonitoringFilterSpec::DataChange(DataChangeFilter {
        deadband_type: DeadbandType::Absolute,
        deadband_value: 2.0,
    });
    session
        .subscriptions()
        .modify_monitored_item(
            &session,
            key,
            client_handle,
            100.0,
            1,
            FilterUpdate::New(replacement.clone()),
        )
        .await
        .unwrap();
    assert_eq!(
        transport.last_item_filter(),
        Some(opcua_core::transport::MonitoringFilter::DataChange(DataChangeFilter {
            deadband_type: DeadbandType::Absolute,
            deadband_value: 2.0,
        }))
    );

    session.close().await.unwrap();
}

/// A second `delete_subscription` on an already-deleted key fails with
/// `ErrorKind::Usage` rather than silently succeeding.
#[tokio::test]
async fn delete_subscription_twice_returns_usage_error_the_second_time() {
    let transport = FakeTransport::new();
    let session = connect(transport).await;

    let key = session
        .subscriptions()
        .create_subscription(&session, SubscriptionParams::default())
        .await
        .unwrap();

    session.subscriptions().delete_subscription(&session, key).await.unwrap();
    let err = session
        .subscriptions()
        .delete_subscription(&session, key)
        .await
        .expect_err("second delete must fail");
    assert_eq!(err.kind(), opcua_core::ErrorKind::Usage);

    session.close().await.unwrap();
}

/// `close(); close()` is a no-op on the second call.
#[tokio::test]
async fn session_close_is_idempotent() {
    let transport = FakeTransport::new();
    let session = connect(transport).await;
    session.close().await.unwrap();
    session.close().await.unwrap();
}

/// Toggling a MonitoredItem from Reporting to Disabled stops delivery;
/// toggling back to Reporting resumes it for subsequent changes.
#[tokio::test]
async fn monitoring_mode_toggle_suppresses_then_resumes_delivery() {
    let transport = FakeTransport::new();
    let session = connect(transport.clone()).await;

    let key = session
        .subscriptions()
        .create_subscription(
            &session,
            SubscriptionParams { publishing_interval_ms: 50.0, ..SubscriptionParams::default() },
        )
        .await
        .unwrap();

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
    wait_for_len(&received, 1).await;

    session
        .subscriptions()
        .set_monitoring_mode(
            &session,
            key,
            &[client_handle],
            opcua_types::MonitoringMode::Disabled,
        )
        .await
        .unwrap();

    for v in [2, 3, 4, 5, 6] {
        transport.push_data_change(1, client_handle, v);
    }
    // give the pump time to deliver anything it would have delivered.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*received.lock().unwrap(), vec![1], "no notifications while Disabled");

    session
        .subscriptions()
        .set_monitoring_mode(
            &session,
            key,
            &[client_handle],
            opcua_types::MonitoringMode::Reporting,
        )
        .await
        .unwrap();

    transport.push_data_change(1, client_handle, 7);
    wait_for_len(&received, 2).await;
    assert_eq!(*received.lock().unwrap(), vec![1, 7]);

    session.close().await.unwrap();
}
