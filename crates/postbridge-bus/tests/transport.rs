#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use tokio::sync::mpsc;

use postbridge_bus::transport::{pair, TransportAdapter};
use postbridge_bus::Side;
use postbridge_core::protocol::{encode_envelope, Envelope, MessageType, StateUpdate};

fn update(n: u64) -> Envelope {
    Envelope::new(StateUpdate {
        path: vec!["n".into()],
        value: json!(n),
    })
}

#[tokio::test]
async fn malformed_frames_are_skipped_in_order() {
    let (local, peer) = pair(16);
    let adapter = TransportAdapter::new(Side::Webview, local.sink);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = adapter.on_raw_receive(local.inbound, move |env| {
        let _ = tx.send(env);
    });

    let first = update(1);
    let second = update(2);
    peer.sink.post(encode_envelope(&first).unwrap()).unwrap();
    peer.sink.post(Bytes::from_static(b"{not json")).unwrap();
    peer.sink
        .post(Bytes::from_static(br#"{"type":"NOPE","payload":{},"timestamp":"2024-05-01T12:00:00Z"}"#))
        .unwrap();
    peer.sink.post(encode_envelope(&second).unwrap()).unwrap();
    drop(peer);

    let a = rx.recv().await.unwrap();
    let b = rx.recv().await.unwrap();
    assert_eq!(a.id(), first.id());
    assert_eq!(b.id(), second.id());
    assert_eq!(b.message_type(), MessageType::StateUpdate);

    // Peer gone: the receive task ends and no more envelopes arrive.
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn send_raw_to_closed_peer_is_swallowed() {
    let (local, peer) = pair(1);
    let adapter = TransportAdapter::new(Side::Host, local.sink);
    drop(peer);

    adapter.send_raw(&update(1));
    adapter.send_raw(&update(2));
}

#[tokio::test]
async fn full_channel_drops_instead_of_blocking() {
    let (local, mut peer) = pair(1);
    let adapter = TransportAdapter::new(Side::Host, local.sink);

    adapter.send_raw(&update(1));
    adapter.send_raw(&update(2));

    assert!(peer.inbound.try_recv().is_ok());
    assert!(peer.inbound.try_recv().is_err());
}
