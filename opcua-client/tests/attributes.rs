// SPDX-License-Identifier: MPL-2.0

//! Read/Write facade, driven against [`support::FakeTransport`].

mod support;

use std::sync::Arc;

use opcua_client::{ConnectOptions, Session};
use opcua_core::config::ClientConfig;
use opcua_types::{AttributeId, NodeId, StatusCode, Variant};

use support::FakeTransport;

async fn connect(transport: Arc<FakeTransport>) -> Session {
    Session::connect(
        transport,
        "opc.tcp://fake:4840",
        ConnectOptions::default(),
        ClientConfig::default(),
    )
    .await
    .expect("connect to fake server")
}

/// `write(n, attr, v); read(n, attr) == DataValue(value=v, status=Good)`.
#[tokio::test]
async fn write_then_read_round_trips() {
    let transport = FakeTransport::new();
    let session = connect(transport).await;
    let node = NodeId::new(1u16, "widget".to_string());

    session
        .write(node.clone(), AttributeId::Value, Variant::Int32(42))
        .await
        .expect("write");

    let result = session
        .read(node, AttributeId::Value)
        .await
        .expect("read");

    assert_eq!(result.status, StatusCode::GOOD);
    assert_eq!(result.value, Some(Variant::Int32(42)));
}

/// Reads of distinct nodes don't alias through shared fake-server storage.
#[tokio::test]
async fn writes_to_distinct_nodes_are_independent() {
    let transport = FakeTransport::new();
    let session = connect(transport).await;
    let a = NodeId::new(1u16, "a".to_string());
    let b = NodeId::new(1u16, "b".to_string());

    session
        .write(a.clone(), AttributeId::Value, Variant::Int32(1))
        .await
        .expect("write a");
    session
        .write(b.clone(), AttributeId::Value, Variant::Int32(2))
        .await
        .expect("write b");

    let read_a = session.read(a, AttributeId::Value).await.expect("read a");
    let read_b = session.read(b, AttributeId::Value).await.expect("read b");

    assert_eq!(read_a.value, Some(Variant::Int32(1)));
    assert_eq!(read_b.value, Some(Variant::Int32(2)));
}
