//! Envelope construction and encoding.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;

use serde_json::{json, Value};

use postbridge_core::protocol::{
    decode_envelope, encode_envelope, DataResponse, Envelope, ErrorReport, Lifecycle, Message,
    MessageType, StateUpdate,
};
use postbridge_core::BridgeError;

#[test]
fn fresh_envelopes_have_distinct_ids() {
    let ids: HashSet<String> = (0..1000)
        .map(|_| {
            Envelope::new(StateUpdate { path: vec![], value: Value::Null })
                .id()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn encoded_form_uses_wire_field_names() {
    let env = Envelope::with_id(
        "req-1",
        DataResponse { resource: "profile".into(), data: json!({"name": "ada"}), error: None },
    );
    let raw = encode_envelope(&env).unwrap();
    let v: Value = serde_json::from_slice(&raw).unwrap();

    assert_eq!(v["type"], "DATA_RESPONSE");
    assert_eq!(v["id"], "req-1");
    assert_eq!(v["payload"]["resource"], "profile");
    assert!(v["payload"].get("error").is_none());
    assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn json_payload_survives_the_boundary() {
    let value = json!({
        "scores": [1, 2.5, -3],
        "nested": { "ok": true, "none": null, "text": "héllo \"quoted\"" }
    });
    let env = Envelope::new(StateUpdate { path: vec!["game".into()], value: value.clone() });

    let back = decode_envelope(&encode_envelope(&env).unwrap()).unwrap();
    assert_eq!(back.id(), env.id());
    let Message::StateUpdate(update) = back.into_message() else {
        panic!("expected StateUpdate");
    };
    assert_eq!(update.value, value);
}

#[test]
fn lifecycle_variants_share_payload_shape() {
    let ready = Envelope::new(Message::WebviewReady(Lifecycle { timestamp: 42 }));
    let mounted = Envelope::new(Message::WebviewMounted(Lifecycle { timestamp: 42 }));
    let a: Value = serde_json::from_slice(&encode_envelope(&ready).unwrap()).unwrap();
    let b: Value = serde_json::from_slice(&encode_envelope(&mounted).unwrap()).unwrap();

    assert_eq!(a["payload"], b["payload"]);
    assert_eq!(a["type"], "WEBVIEW_READY");
    assert_eq!(b["type"], "WEBVIEW_MOUNTED");
}

#[test]
fn handler_failure_report_names_failing_type() {
    let report = ErrorReport::handler_failure(MessageType::UserAction, "boom");
    assert_eq!(report.kind, "HANDLER_ERROR");
    assert_eq!(report.message, "boom");
    assert_eq!(report.failing_type(), Some("USER_ACTION"));
}

#[test]
fn timeout_report_carries_code_and_type() {
    let err = BridgeError::Timeout { message_type: MessageType::DataRequest, timeout_ms: 100 };
    let report = ErrorReport::from_error(&err);
    assert_eq!(report.kind, "TIMEOUT");
    assert_eq!(report.failing_type(), Some("DATA_REQUEST"));
    assert!(report.message.contains("DATA_REQUEST"));
}

#[test]
fn message_type_strings_match_wire_tags() {
    for t in MessageType::ALL {
        let s = serde_json::to_string(&t).unwrap();
        assert_eq!(s, format!("\"{}\"", t.as_str()));
    }
}
