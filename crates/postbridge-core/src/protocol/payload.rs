//! Typed payloads, one shape per `MessageType`.
//!
//! The wire keeps `type` and `payload` as sibling fields; `Message` joins them
//! back into a tagged union so consumers match on variants instead of probing
//! JSON shapes at runtime.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::protocol::MessageType;

/// `STATE_UPDATE`: apply `value` at `path` in the receiver's state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub path: Vec<String>,
    pub value: Value,
}

/// `STATE_REQUEST`: ask the peer for the value at `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRequest {
    pub path: Vec<String>,
}

/// `ERROR_REPORT` payload. Also embedded in responses that carry a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error category (e.g. `HANDLER_ERROR`, `NETWORK_ERROR`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            details: None,
            stack: None,
        }
    }

    /// Report for a handler that failed while processing `failing`.
    pub fn handler_failure(failing: MessageType, reason: impl Into<String>) -> Self {
        Self::new(crate::ErrorCode::HandlerError.as_str(), reason)
            .with_detail("messageType", Value::String(failing.as_str().to_owned()))
    }

    /// Report for a local error; `kind` is the error's stable code.
    pub fn from_error(err: &BridgeError) -> Self {
        let report = Self::new(err.code().as_str(), err.to_string());
        match err {
            BridgeError::Timeout { message_type, .. } => report
                .with_detail("messageType", Value::String(message_type.as_str().to_owned())),
            _ => report,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// `details.messageType`, when the report names one.
    pub fn failing_type(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("messageType"))
            .and_then(Value::as_str)
    }
}

/// `ERROR_ACKNOWLEDGE`: the receiver saw an error report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAcknowledge {
    /// Envelope id of the acknowledged report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
}

/// `USER_ACTION`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `ACTION_RESPONSE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// `WEBVIEW_READY` / `WEBVIEW_MOUNTED`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Lifecycle {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// `DATA_REQUEST`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// `DATA_RESPONSE`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    pub resource: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Tagged union over every message type and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    StateUpdate(StateUpdate),
    StateRequest(StateRequest),
    ErrorReport(ErrorReport),
    ErrorAcknowledge(ErrorAcknowledge),
    UserAction(UserAction),
    ActionResponse(ActionResponse),
    WebviewReady(Lifecycle),
    WebviewMounted(Lifecycle),
    DataRequest(DataRequest),
    DataResponse(DataResponse),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::StateUpdate(_) => MessageType::StateUpdate,
            Message::StateRequest(_) => MessageType::StateRequest,
            Message::ErrorReport(_) => MessageType::ErrorReport,
            Message::ErrorAcknowledge(_) => MessageType::ErrorAcknowledge,
            Message::UserAction(_) => MessageType::UserAction,
            Message::ActionResponse(_) => MessageType::ActionResponse,
            Message::WebviewReady(_) => MessageType::WebviewReady,
            Message::WebviewMounted(_) => MessageType::WebviewMounted,
            Message::DataRequest(_) => MessageType::DataRequest,
            Message::DataResponse(_) => MessageType::DataResponse,
        }
    }

    /// Serialize the payload half of the message.
    pub fn to_payload(&self) -> Result<Value> {
        let v = match self {
            Message::StateUpdate(p) => serde_json::to_value(p),
            Message::StateRequest(p) => serde_json::to_value(p),
            Message::ErrorReport(p) => serde_json::to_value(p),
            Message::ErrorAcknowledge(p) => serde_json::to_value(p),
            Message::UserAction(p) => serde_json::to_value(p),
            Message::ActionResponse(p) => serde_json::to_value(p),
            Message::WebviewReady(p) | Message::WebviewMounted(p) => serde_json::to_value(p),
            Message::DataRequest(p) => serde_json::to_value(p),
            Message::DataResponse(p) => serde_json::to_value(p),
        };
        v.map_err(|e| BridgeError::Internal(format!("payload encode failed: {e}")))
    }

    /// Rebuild a message from its tag and raw payload.
    pub fn from_payload(msg_type: MessageType, payload: Value) -> Result<Self> {
        Ok(match msg_type {
            MessageType::StateUpdate => Message::StateUpdate(parse(msg_type, payload)?),
            MessageType::StateRequest => Message::StateRequest(parse(msg_type, payload)?),
            MessageType::ErrorReport => Message::ErrorReport(parse(msg_type, payload)?),
            MessageType::ErrorAcknowledge => Message::ErrorAcknowledge(parse(msg_type, payload)?),
            MessageType::UserAction => Message::UserAction(parse(msg_type, payload)?),
            MessageType::ActionResponse => Message::ActionResponse(parse(msg_type, payload)?),
            MessageType::WebviewReady => Message::WebviewReady(parse(msg_type, payload)?),
            MessageType::WebviewMounted => Message::WebviewMounted(parse(msg_type, payload)?),
            MessageType::DataRequest => Message::DataRequest(parse(msg_type, payload)?),
            MessageType::DataResponse => Message::DataResponse(parse(msg_type, payload)?),
        })
    }
}

fn parse<T: DeserializeOwned>(msg_type: MessageType, payload: Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| BridgeError::Malformed(format!("invalid {msg_type} payload: {e}")))
}

macro_rules! impl_from_payload {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Message {
                fn from(p: $ty) -> Self {
                    Message::$ty(p)
                }
            }
        )*
    };
}

impl_from_payload!(
    StateUpdate,
    StateRequest,
    ErrorReport,
    ErrorAcknowledge,
    UserAction,
    ActionResponse,
    DataRequest,
    DataResponse,
);
