//! WebSocket frame codec for the host bridge endpoint.
//!
//! - Text / Binary frames => raw envelope bytes (decoded later by the adapter)
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use bytes::Bytes;

use postbridge_core::error::{BridgeError, Result};

#[derive(Debug)]
pub enum Inbound {
    Frame(Bytes),
    Ping(Vec<u8>),
    Pong,
    Close,
}

pub fn decode(msg: Message) -> Inbound {
    match msg {
        Message::Text(s) => Inbound::Frame(Bytes::from(s)),
        Message::Binary(b) => Inbound::Frame(Bytes::from(b)),
        Message::Ping(v) => Inbound::Ping(v),
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
    }
}

/// Envelopes are JSON, so they leave as Text frames.
pub fn encode(frame: Bytes) -> Result<Message> {
    String::from_utf8(frame.to_vec())
        .map(Message::Text)
        .map_err(|e| BridgeError::Transport(format!("outbound frame is not utf-8: {e}")))
}
