//! Envelope (JSON text on the wire).
//!
//! Wire shape:
//! `{ "type": "STATE_UPDATE", "payload": {...}, "id": "...", "timestamp": "2024-01-01T00:00:00.000Z" }`
//!
//! `id` is optional inbound; every envelope built here carries one.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{BridgeError, Result};
use crate::protocol::{Message, MessageType};

/// The unit of exchange. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    message: Message,
    id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Envelope {
    /// New envelope with a fresh 128-bit random id and the current time.
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            id: Some(fresh_id()),
            timestamp: Utc::now(),
        }
    }

    /// Envelope carrying a caller-chosen id (responses reuse the request id).
    pub fn with_id(id: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            id: Some(id.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn from_parts(message: Message, id: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            message,
            id,
            timestamp,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_type(&self) -> MessageType {
        self.message.message_type()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn into_message(self) -> Message {
        self.message
    }
}

/// Fresh envelope id (UUID v4).
pub fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEnvelope {
    #[serde(rename = "type")]
    msg_type: MessageType,
    payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    timestamp: DateTime<Utc>,
}

/// Serialize an envelope to its JSON wire form.
pub fn encode_envelope(env: &Envelope) -> Result<Bytes> {
    let wire = WireEnvelope {
        msg_type: env.message_type(),
        payload: env.message.to_payload()?,
        id: env.id.clone(),
        timestamp: env.timestamp,
    };
    serde_json::to_vec(&wire)
        .map(Bytes::from)
        .map_err(|e| BridgeError::Internal(format!("envelope encode failed: {e}")))
}

/// Parse an envelope from raw bytes. Anything off-shape is `Malformed`.
pub fn decode_envelope(raw: &[u8]) -> Result<Envelope> {
    let wire: WireEnvelope = serde_json::from_slice(raw)
        .map_err(|e| BridgeError::Malformed(format!("invalid envelope json: {e}")))?;

    if matches!(wire.id.as_deref(), Some("")) {
        return Err(BridgeError::Malformed("empty envelope id".into()));
    }

    let message = Message::from_payload(wire.msg_type, wire.payload)?;
    Ok(Envelope {
        message,
        id: wire.id,
        timestamp: wire.timestamp,
    })
}
