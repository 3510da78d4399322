//! Raw channels: a sink for outbound frames plus an ordered inbound queue.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use postbridge_core::error::{BridgeError, Result};

/// Outbound half of a raw channel. Must not block.
pub trait RawSink: Send + Sync + 'static {
    fn post(&self, frame: Bytes) -> Result<()>;
}

/// Sink backed by a bounded tokio queue (`try_send`, never awaits).
#[derive(Clone)]
pub struct MpscSink {
    tx: mpsc::Sender<Bytes>,
}

impl MpscSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

impl RawSink for MpscSink {
    fn post(&self, frame: Bytes) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                BridgeError::Transport("raw channel full".into())
            }
            mpsc::error::TrySendError::Closed(_) => {
                BridgeError::Transport("peer closed".into())
            }
        })
    }
}

/// One end of a bidirectional raw channel.
pub struct RawEndpoint {
    pub sink: Arc<dyn RawSink>,
    pub inbound: mpsc::Receiver<Bytes>,
}

impl RawEndpoint {
    pub fn new(sink: Arc<dyn RawSink>, inbound: mpsc::Receiver<Bytes>) -> Self {
        Self { sink, inbound }
    }
}

/// In-process channel pair: frames posted on one end arrive, in order, on the
/// other. Each direction buffers up to `capacity` frames.
pub fn pair(capacity: usize) -> (RawEndpoint, RawEndpoint) {
    let capacity = capacity.max(1);
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);
    (
        RawEndpoint::new(Arc::new(MpscSink::new(b_tx)), a_rx),
        RawEndpoint::new(Arc::new(MpscSink::new(a_tx)), b_rx),
    )
}
