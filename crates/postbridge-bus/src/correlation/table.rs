use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use postbridge_core::error::{BridgeError, Result};
use postbridge_core::protocol::{Envelope, Message, MessageType};

use crate::context::Side;

type Completion = oneshot::Sender<Result<Message>>;

struct PendingEntry {
    message_type: MessageType,
    tx: Completion,
    timer: Option<JoinHandle<()>>,
}

impl PendingEntry {
    fn settle(self, outcome: Result<Message>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        // Receiver gone means the caller stopped waiting; nothing to do.
        let _ = self.tx.send(outcome);
    }
}

/// In-flight requests keyed by envelope id.
///
/// Each entry is settled at most once: whichever of response or deadline
/// removes it from the map first wins, the other finds nothing.
#[derive(Clone)]
pub struct CorrelationTable {
    side: Side,
    pending: Arc<DashMap<String, PendingEntry>>,
    max_pending: usize,
}

impl CorrelationTable {
    pub fn new(side: Side, max_pending: usize) -> Self {
        Self {
            side,
            pending: Arc::new(DashMap::new()),
            max_pending: max_pending.max(1),
        }
    }

    /// Create a pending entry for `id` and arm its deadline.
    ///
    /// Must be called before the request leaves, so a fast response always
    /// finds its entry. Needs a tokio runtime (the deadline is a task).
    pub fn register(&self, id: &str, message_type: MessageType, timeout: Duration) -> Result<PendingReply> {
        let pending_len = self.pending.len();
        if pending_len >= self.max_pending {
            tracing::warn!(
                side = %self.side,
                pending_len,
                max_pending = self.max_pending,
                msg_type = %message_type,
                "too many pending requests; refusing new request"
            );
            return Err(BridgeError::Overloaded { limit: self.max_pending });
        }

        let (tx, rx) = oneshot::channel();
        match self.pending.entry(id.to_owned()) {
            Entry::Occupied(_) => {
                return Err(BridgeError::Internal(format!("duplicate request id: {id}")));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    message_type,
                    tx,
                    timer: None,
                });
            }
        }

        let timer = self.spawn_deadline(id.to_owned(), timeout);
        match self.pending.get_mut(id) {
            Some(mut entry) => entry.timer = Some(timer),
            // Already resolved between insert and arming.
            None => timer.abort(),
        }

        tracing::debug!(side = %self.side, id, msg_type = %message_type, timeout_ms = timeout.as_millis() as u64, "request pending");

        Ok(PendingReply {
            id: id.to_owned(),
            rx,
        })
    }

    fn spawn_deadline(&self, id: String, timeout: Duration) -> JoinHandle<()> {
        let table = Arc::downgrade(&self.pending);
        let side = self.side;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(table) = table.upgrade() else { return };
            let Some((_, entry)) = table.remove(&id) else { return };

            let message_type = entry.message_type;
            let timeout_ms = timeout.as_millis() as u64;
            tracing::debug!(side = %side, id = %id, msg_type = %message_type, timeout_ms, "request timed out");

            // The timer is this task; dropping the handle is enough.
            let _ = entry.tx.send(Err(BridgeError::Timeout {
                message_type,
                timeout_ms,
            }));
        })
    }

    /// Fulfil the entry for `id`. Returns false when there is none (late,
    /// duplicate or never requested); that is not an error.
    pub fn resolve(&self, id: &str, message: Message) -> bool {
        match self.take(id) {
            Some(entry) => {
                entry.settle(Ok(message));
                true
            }
            None => false,
        }
    }

    /// Offer an inbound envelope. Consumed when its id matches a pending
    /// request; handed back otherwise.
    pub fn try_route(&self, env: Envelope) -> Option<Envelope> {
        let Some(id) = env.id() else {
            return Some(env);
        };
        match self.take(id) {
            Some(entry) => {
                entry.settle(Ok(env.into_message()));
                None
            }
            None => Some(env),
        }
    }

    fn take(&self, id: &str) -> Option<PendingEntry> {
        let taken = self.pending.remove(id).map(|(_, entry)| entry);
        match &taken {
            Some(entry) => {
                tracing::debug!(side = %self.side, id, msg_type = %entry.message_type, "request resolved");
            }
            None => {
                tracing::trace!(side = %self.side, id, "no pending request for id");
            }
        }
        taken
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Completion side of a pending request.
#[derive(Debug)]
pub struct PendingReply {
    id: String,
    rx: oneshot::Receiver<Result<Message>>,
}

impl PendingReply {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the response or the deadline.
    pub async fn wait(self) -> Result<Message> {
        self.rx.await.unwrap_or(Err(BridgeError::Closed))
    }
}
