use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;

use postbridge_core::error::Result;
use postbridge_core::protocol::{fresh_id, Envelope, Message, MessageType};

use crate::config::BusConfig;
use crate::context::Side;
use crate::correlation::CorrelationTable;
use crate::dispatch::{handler_fn, DispatchRegistry, Handler, Subscription};
use crate::error_channel::ErrorChannel;
use crate::transport::{RawEndpoint, TransportAdapter};

/// One bus per context. Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

/// Non-owning handle, for handlers that need to send through the bus they
/// are registered on without keeping it alive.
#[derive(Clone)]
pub struct WeakBus {
    inner: Weak<BusInner>,
}

impl WeakBus {
    pub fn upgrade(&self) -> Option<Bus> {
        self.inner.upgrade().map(|inner| Bus { inner })
    }
}

struct BusInner {
    side: Side,
    cfg: BusConfig,
    transport: TransportAdapter,
    registry: Arc<DispatchRegistry>,
    pending: CorrelationTable,
    errors: ErrorChannel,
}

impl Bus {
    /// Build a bus over `endpoint` and start its receive path.
    ///
    /// Spawns the receive task and one dispatch lane per message type, so it
    /// must run inside a tokio runtime.
    pub fn start(side: Side, endpoint: RawEndpoint, cfg: BusConfig) -> Self {
        let RawEndpoint { sink, inbound } = endpoint;

        let transport = TransportAdapter::new(side, sink);
        let errors = ErrorChannel::new(transport.clone());
        let registry = Arc::new(DispatchRegistry::new(side, errors.clone()));
        let pending = CorrelationTable::new(side, cfg.max_pending_requests);

        let router = InboundRouter {
            side,
            pending: pending.clone(),
            lanes: spawn_lanes(side, &registry),
        };
        transport.on_raw_receive(inbound, move |env| router.route(env));

        tracing::info!(side = %side, default_timeout_ms = cfg.default_timeout_ms, "bus started");

        Self {
            inner: Arc::new(BusInner {
                side,
                cfg,
                transport,
                registry,
                pending,
                errors,
            }),
        }
    }

    pub fn side(&self) -> Side {
        self.inner.side
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.cfg
    }

    pub fn downgrade(&self) -> WeakBus {
        WeakBus {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn errors(&self) -> &ErrorChannel {
        &self.inner.errors
    }

    /// Fire-and-forget. Returns the new envelope id; delivery problems are
    /// logged by the transport, never returned here.
    pub fn send(&self, message: impl Into<Message>) -> String {
        let id = fresh_id();
        self.post(Envelope::with_id(id.clone(), message));
        id
    }

    /// Answer `request` with `message`, reusing the request id so the peer's
    /// pending `send_and_wait` resolves. A request without id gets a fresh one.
    pub fn reply(&self, request: &Envelope, message: impl Into<Message>) -> String {
        let id = request.id().map(str::to_owned).unwrap_or_else(fresh_id);
        self.post(Envelope::with_id(id.clone(), message));
        id
    }

    /// Request/response with the configured default deadline.
    pub async fn send_and_wait(&self, message: impl Into<Message>) -> Result<Message> {
        let timeout = self.inner.cfg.default_timeout();
        self.send_and_wait_timeout(message, timeout).await
    }

    /// Request/response. Fails with `Timeout` naming the request type when
    /// no envelope with the same id comes back within `timeout`.
    pub async fn send_and_wait_timeout(
        &self,
        message: impl Into<Message>,
        timeout: Duration,
    ) -> Result<Message> {
        let id = fresh_id();
        let env = Envelope::with_id(id.clone(), message);

        let reply = self
            .inner
            .pending
            .register(&id, env.message_type(), timeout)?;
        self.post(env);

        reply.wait().await
    }

    /// Subscribe `handler` to `msg_type`.
    pub fn on(&self, msg_type: MessageType, handler: Arc<dyn Handler>) -> Subscription {
        self.inner.registry.register(msg_type, handler)
    }

    /// Subscribe an async closure. Each call is a distinct registration.
    pub fn on_fn<F, Fut>(&self, msg_type: MessageType, f: F) -> Subscription
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on(msg_type, Arc::new(handler_fn(f)))
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn handler_count(&self, msg_type: MessageType) -> usize {
        self.inner.registry.handler_count(msg_type)
    }

    fn post(&self, env: Envelope) {
        tracing::trace!(side = %self.inner.side, msg_type = %env.message_type(), id = env.id().unwrap_or("-"), "send");
        self.inner.transport.send_raw(&env);
    }
}

/// Receive path: correlation first, then the lane for the envelope's type.
/// Runs on the transport's receive task and never awaits a handler.
struct InboundRouter {
    side: Side,
    pending: CorrelationTable,
    lanes: HashMap<MessageType, mpsc::UnboundedSender<Envelope>>,
}

impl InboundRouter {
    fn route(&self, env: Envelope) {
        let Some(env) = self.pending.try_route(env) else {
            return;
        };

        let msg_type = env.message_type();
        match self.lanes.get(&msg_type) {
            Some(lane) => {
                if lane.send(env).is_err() {
                    tracing::warn!(side = %self.side, msg_type = %msg_type, "dispatch lane closed; envelope dropped");
                }
            }
            None => {
                tracing::warn!(side = %self.side, msg_type = %msg_type, "no dispatch lane");
            }
        }
    }
}

/// One sequential worker per type: envelopes of a type are dispatched in
/// receipt order, one at a time; different types proceed independently.
/// The handler set is read when the lane reaches the envelope.
fn spawn_lanes(
    side: Side,
    registry: &Arc<DispatchRegistry>,
) -> HashMap<MessageType, mpsc::UnboundedSender<Envelope>> {
    MessageType::ALL
        .into_iter()
        .map(|msg_type| {
            let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
            // Only the bus holds the registry (and its outbound sink) strongly.
            let registry = Arc::downgrade(registry);
            tokio::spawn(async move {
                while let Some(env) = rx.recv().await {
                    let Some(registry) = registry.upgrade() else {
                        tracing::debug!(side = %side, msg_type = %msg_type, "bus dropped; lane stopped");
                        break;
                    };
                    let outcome = registry.dispatch(&env).await;
                    tracing::trace!(
                        side = %side,
                        msg_type = %msg_type,
                        invoked = outcome.invoked,
                        failed = outcome.failed,
                        "dispatched"
                    );
                }
            });
            (msg_type, tx)
        })
        .collect()
}
