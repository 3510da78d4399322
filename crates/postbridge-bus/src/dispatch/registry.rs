use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use futures_util::FutureExt;

use postbridge_core::protocol::{Envelope, MessageType};

use crate::context::Side;
use crate::dispatch::Handler;
use crate::error_channel::ErrorChannel;

struct Registration {
    id: u64,
    handler: Arc<dyn Handler>,
}

/// Per-type handler sets, kept in registration order.
pub struct DispatchRegistry {
    side: Side,
    handlers: DashMap<MessageType, Vec<Registration>>,
    next_id: AtomicU64,
    errors: ErrorChannel,
}

/// Counts from one `dispatch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub invoked: usize,
    pub failed: usize,
}

impl DispatchRegistry {
    pub fn new(side: Side, errors: ErrorChannel) -> Self {
        Self {
            side,
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
            errors,
        }
    }

    /// Add `handler` for `msg_type`.
    ///
    /// The same `Arc` registered twice for one type stays a single
    /// registration; the returned handle then refers to the existing one.
    pub fn register(self: &Arc<Self>, msg_type: MessageType, handler: Arc<dyn Handler>) -> Subscription {
        let mut set = self.handlers.entry(msg_type).or_default();

        let id = match set.iter().find(|r| same_handler(&r.handler, &handler)) {
            Some(existing) => existing.id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                set.push(Registration { id, handler });
                id
            }
        };
        let count = set.len();
        drop(set);

        tracing::debug!(side = %self.side, msg_type = %msg_type, registration = id, handlers = count, "handler registered");

        Subscription {
            registry: Arc::downgrade(self),
            msg_type,
            id,
        }
    }

    /// Remove one registration. Returns false when it was already gone.
    pub fn unregister(&self, msg_type: MessageType, id: u64) -> bool {
        let Some(mut set) = self.handlers.get_mut(&msg_type) else {
            return false;
        };
        let before = set.len();
        set.retain(|r| r.id != id);
        let removed = set.len() != before;
        if set.is_empty() {
            drop(set);
            self.handlers.remove_if(&msg_type, |_, v| v.is_empty());
        }
        if removed {
            tracing::debug!(side = %self.side, msg_type = %msg_type, registration = id, "handler unregistered");
        }
        removed
    }

    pub fn handler_count(&self, msg_type: MessageType) -> usize {
        self.handlers.get(&msg_type).map(|s| s.len()).unwrap_or(0)
    }

    /// Invoke every handler registered for the envelope's type, one after
    /// another, in registration order.
    ///
    /// The handler set is snapshotted first: handlers added while this
    /// envelope is being dispatched see only later envelopes. A failing
    /// handler is reported through the error channel and does not stop the
    /// rest. Failures while handling `ERROR_REPORT` or `ERROR_ACKNOWLEDGE`
    /// are only logged.
    pub async fn dispatch(&self, env: &Envelope) -> DispatchOutcome {
        let msg_type = env.message_type();
        let snapshot: Vec<Arc<dyn Handler>> = self
            .handlers
            .get(&msg_type)
            .map(|set| set.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default();

        let mut outcome = DispatchOutcome::default();
        if snapshot.is_empty() {
            tracing::trace!(side = %self.side, msg_type = %msg_type, "no handlers");
            return outcome;
        }

        for handler in snapshot {
            outcome.invoked += 1;

            let reason = match AssertUnwindSafe(handler.handle(env)).catch_unwind().await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
            };
            outcome.failed += 1;

            if !reports_failures(msg_type) {
                tracing::warn!(side = %self.side, msg_type = %msg_type, id = env.id().unwrap_or("-"), reason = %reason, "error-traffic handler failed");
                continue;
            }

            tracing::warn!(side = %self.side, msg_type = %msg_type, id = env.id().unwrap_or("-"), reason = %reason, "handler failed");
            self.errors.report_handler_failure(msg_type, &reason);
        }

        outcome
    }
}

/// Handle returned by registration. Dropping it keeps the handler registered.
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<DispatchRegistry>,
    msg_type: MessageType,
    id: u64,
}

impl Subscription {
    /// Remove the registration. Safe to call more than once.
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.unregister(self.msg_type, self.id))
            .unwrap_or(false)
    }

    pub fn message_type(&self) -> MessageType {
        self.msg_type
    }
}

/// Error traffic never produces more error traffic: a report answered with
/// an acknowledgement must not come back as another report.
fn reports_failures(msg_type: MessageType) -> bool {
    !matches!(msg_type, MessageType::ErrorReport | MessageType::ErrorAcknowledge)
}

fn same_handler(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
