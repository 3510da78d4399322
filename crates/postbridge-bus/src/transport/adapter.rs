//! Transport adapter: envelope <-> raw frame, best-effort send, ordered receive.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use postbridge_core::protocol::{decode_envelope, encode_envelope, Envelope};

use crate::context::Side;
use crate::transport::channel::RawSink;

#[derive(Clone)]
pub struct TransportAdapter {
    side: Side,
    sink: Arc<dyn RawSink>,
}

impl TransportAdapter {
    pub fn new(side: Side, sink: Arc<dyn RawSink>) -> Self {
        Self { side, sink }
    }

    /// Serialize and post. Never blocks and never fails the caller: encode
    /// and channel faults are logged and the frame is dropped.
    pub fn send_raw(&self, env: &Envelope) {
        let frame = match encode_envelope(env) {
            Ok(f) => f,
            Err(e) => {
                tracing::error!(side = %self.side, msg_type = %env.message_type(), error = %e, "envelope encode failed");
                return;
            }
        };

        if let Err(e) = self.sink.post(frame) {
            tracing::warn!(
                side = %self.side,
                peer = %self.side.peer(),
                msg_type = %env.message_type(),
                id = env.id().unwrap_or("-"),
                error = %e,
                "transport send failed; frame dropped"
            );
        }
    }

    /// Attach the single downstream consumer. It runs once per decoded
    /// envelope, in receipt order, on one task. Undecodable frames are
    /// logged and skipped. The task ends when the inbound queue closes.
    pub fn on_raw_receive<F>(&self, mut inbound: mpsc::Receiver<Bytes>, mut consumer: F) -> JoinHandle<()>
    where
        F: FnMut(Envelope) + Send + 'static,
    {
        let side = self.side;
        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                match decode_envelope(&frame) {
                    Ok(env) => consumer(env),
                    Err(e) => {
                        tracing::warn!(side = %side, bytes_len = frame.len(), error = %e, "malformed envelope dropped");
                    }
                }
            }
            tracing::debug!(side = %side, "raw channel closed");
        })
    }
}
