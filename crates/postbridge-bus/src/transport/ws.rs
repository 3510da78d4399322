//! WebSocket bridge: one webview connection = one raw channel = one host bus.
//!
//! The socket loop only moves frames. Envelope decoding happens in the
//! transport adapter on the bus side, so a bad frame never ends the session.

use axum::{
    extract::{ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::host::HostState;
use crate::transport::channel::{MpscSink, RawEndpoint};
use crate::transport::codec::{decode, encode, Inbound};

pub async fn bridge_upgrade(State(host): State<HostState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_bridge(host, socket))
}

async fn run_bridge(host: HostState, socket: WebSocket) {
    let capacity = host.cfg().bus.channel_capacity;

    // host bus -> socket
    let (out_tx, mut out_rx) = mpsc::channel::<Bytes>(capacity);
    // socket -> host bus
    let (in_tx, in_rx) = mpsc::channel::<Bytes>(capacity);

    let bus = host.attach(RawEndpoint::new(Arc::new(MpscSink::new(out_tx)), in_rx));
    tracing::info!(side = %bus.side(), "webview connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(frame) = maybe_out else { break; };
                let msg = match encode(frame) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(error = %e, "outbound frame dropped");
                        continue;
                    }
                };
                if ws_tx.send(msg).await.is_err() {
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                match decode(msg) {
                    Inbound::Frame(frame) => {
                        // Backpressure: a slow bus slows the socket reader.
                        if in_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Inbound::Ping(payload) => {
                        if ws_tx.send(axum::extract::ws::Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Inbound::Pong => {}
                    Inbound::Close => break,
                }
            }
        }
    }

    // Closing the inbound queue stops the bus receive task and its lanes.
    drop(in_tx);
    tracing::info!(pending = bus.pending_requests(), "webview disconnected");
}
