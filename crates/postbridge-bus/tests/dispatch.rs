#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use postbridge_bus::dispatch::{handler_fn, DispatchRegistry, Handler};
use postbridge_bus::error_channel::ErrorChannel;
use postbridge_bus::transport::{pair, RawEndpoint, TransportAdapter};
use postbridge_bus::Side;
use postbridge_core::error::{BridgeError, Result};
use postbridge_core::protocol::{
    decode_envelope, Envelope, ErrorAcknowledge, ErrorReport, Message, MessageType, StateUpdate, UserAction,
};

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    tag: &'static str,
    log: Log,
}

#[async_trait]
impl Handler for Recorder {
    async fn handle(&self, env: &Envelope) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.tag, env.message_type()));
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl Handler for Failing {
    async fn handle(&self, _env: &Envelope) -> Result<()> {
        Err(BridgeError::handler("boom"))
    }
}

struct Panicking;

#[async_trait]
impl Handler for Panicking {
    async fn handle(&self, _env: &Envelope) -> Result<()> {
        panic!("kaboom");
    }
}

/// Registry wired to one end of a raw pair; the other end observes what the
/// error channel sends.
fn registry() -> (Arc<DispatchRegistry>, RawEndpoint) {
    let (local, peer) = pair(64);
    let transport = TransportAdapter::new(Side::Host, local.sink);
    let registry = Arc::new(DispatchRegistry::new(Side::Host, ErrorChannel::new(transport)));
    (registry, peer)
}

fn recorder(tag: &'static str, log: &Log) -> Arc<dyn Handler> {
    Arc::new(Recorder {
        tag,
        log: Arc::clone(log),
    })
}

fn state_update() -> Envelope {
    Envelope::new(StateUpdate {
        path: vec!["user".into(), "name".into()],
        value: json!("ada"),
    })
}

fn drain_reports(peer: &mut RawEndpoint) -> Vec<ErrorReport> {
    let mut out = Vec::new();
    while let Ok(frame) = peer.inbound.try_recv() {
        match decode_envelope(&frame).unwrap().into_message() {
            Message::ErrorReport(report) => out.push(report),
            other => panic!("unexpected frame on peer: {:?}", other.message_type()),
        }
    }
    out
}

#[tokio::test]
async fn handlers_run_in_registration_order() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();

    registry.register(MessageType::StateUpdate, recorder("a", &log));
    registry.register(MessageType::StateUpdate, recorder("b", &log));
    registry.register(MessageType::UserAction, recorder("other", &log));

    let outcome = registry.dispatch(&state_update()).await;
    assert_eq!(outcome.invoked, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(
        *log.lock().unwrap(),
        vec!["a:STATE_UPDATE".to_string(), "b:STATE_UPDATE".to_string()]
    );
}

#[tokio::test]
async fn same_handler_registered_twice_runs_once() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();
    let h = recorder("a", &log);

    let first = registry.register(MessageType::StateUpdate, Arc::clone(&h));
    let second = registry.register(MessageType::StateUpdate, Arc::clone(&h));
    assert_eq!(registry.handler_count(MessageType::StateUpdate), 1);

    registry.dispatch(&state_update()).await;
    assert_eq!(log.lock().unwrap().len(), 1);

    // Both handles point at the one registration.
    assert!(first.unsubscribe());
    assert!(!second.unsubscribe());
}

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();

    let sub = registry.register(MessageType::StateUpdate, recorder("a", &log));
    let keep = registry.register(MessageType::StateUpdate, recorder("b", &log));

    assert!(sub.unsubscribe());
    assert!(!sub.unsubscribe());
    assert_eq!(registry.handler_count(MessageType::StateUpdate), 1);

    registry.dispatch(&state_update()).await;
    assert_eq!(*log.lock().unwrap(), vec!["b:STATE_UPDATE".to_string()]);

    assert!(keep.unsubscribe());
    assert_eq!(registry.handler_count(MessageType::StateUpdate), 0);
    assert_eq!(registry.dispatch(&state_update()).await.invoked, 0);
}

#[tokio::test]
async fn dropping_subscription_keeps_handler() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();

    drop(registry.register(MessageType::StateUpdate, recorder("a", &log)));
    registry.dispatch(&state_update()).await;
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_handler_does_not_stop_the_rest() {
    let (registry, mut peer) = registry();
    let log: Log = Default::default();

    registry.register(MessageType::StateUpdate, Arc::new(Failing));
    registry.register(MessageType::StateUpdate, recorder("after", &log));

    let outcome = registry.dispatch(&state_update()).await;
    assert_eq!(outcome.invoked, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(*log.lock().unwrap(), vec!["after:STATE_UPDATE".to_string()]);

    let reports = drain_reports(&mut peer);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, "HANDLER_ERROR");
    assert!(reports[0].message.contains("boom"));
    assert_eq!(reports[0].failing_type(), Some("STATE_UPDATE"));
}

#[tokio::test]
async fn panicking_handler_is_reported() {
    let (registry, mut peer) = registry();
    let log: Log = Default::default();

    registry.register(MessageType::UserAction, Arc::new(Panicking));
    registry.register(MessageType::UserAction, recorder("after", &log));

    let env = Envelope::new(UserAction {
        action: "click".into(),
        data: None,
    });
    let outcome = registry.dispatch(&env).await;
    assert_eq!(outcome.failed, 1);
    assert_eq!(log.lock().unwrap().len(), 1);

    let reports = drain_reports(&mut peer);
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("kaboom"));
    assert_eq!(reports[0].failing_type(), Some("USER_ACTION"));
}

#[tokio::test]
async fn error_report_handler_failure_is_not_re_reported() {
    let (registry, mut peer) = registry();
    registry.register(MessageType::ErrorReport, Arc::new(Failing));

    let env = Envelope::new(ErrorReport::new("NETWORK_ERROR", "offline"));
    let outcome = registry.dispatch(&env).await;
    assert_eq!(outcome.failed, 1);
    assert!(drain_reports(&mut peer).is_empty());
}

#[tokio::test]
async fn error_acknowledge_handler_failure_is_not_re_reported() {
    let (registry, mut peer) = registry();
    registry.register(MessageType::ErrorAcknowledge, Arc::new(Failing));
    registry.register(MessageType::ErrorAcknowledge, Arc::new(Panicking));

    let env = Envelope::new(ErrorAcknowledge {
        report_id: Some("r-1".into()),
    });
    let outcome = registry.dispatch(&env).await;
    assert_eq!(outcome.invoked, 2);
    assert_eq!(outcome.failed, 2);
    assert!(drain_reports(&mut peer).is_empty());
}

#[tokio::test]
async fn handler_added_during_dispatch_sees_only_later_envelopes() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();

    let reg = Arc::downgrade(&registry);
    let late_log = Arc::clone(&log);
    registry.register(
        MessageType::StateUpdate,
        Arc::new(handler_fn(move |_env| {
            let (reg, late_log) = (reg.clone(), Arc::clone(&late_log));
            async move {
                if let Some(reg) = reg.upgrade() {
                    reg.register(
                        MessageType::StateUpdate,
                        Arc::new(Recorder {
                            tag: "late",
                            log: late_log,
                        }),
                    );
                }
                Ok(())
            }
        })),
    );

    assert_eq!(registry.dispatch(&state_update()).await.invoked, 1);
    assert!(log.lock().unwrap().is_empty());

    // The adder ran once more, so two late handlers exist now.
    assert_eq!(registry.dispatch(&state_update()).await.invoked, 2);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn slow_handler_is_awaited_before_the_next() {
    let (registry, _peer) = registry();
    let log: Log = Default::default();

    let slow_log = Arc::clone(&log);
    registry.register(
        MessageType::StateUpdate,
        Arc::new(handler_fn(move |_env| {
            let slow_log = Arc::clone(&slow_log);
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                slow_log.lock().unwrap().push("slow".to_string());
                Ok(())
            }
        })),
    );
    registry.register(MessageType::StateUpdate, recorder("fast", &log));

    registry.dispatch(&state_update()).await;
    assert_eq!(
        *log.lock().unwrap(),
        vec!["slow".to_string(), "fast:STATE_UPDATE".to_string()]
    );
}
