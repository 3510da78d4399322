//! Error channel: handler failures and application errors travel to the peer
//! as `ERROR_REPORT` envelopes instead of being dropped.
//!
//! Inbound error reports are ordinary messages: the local error surface
//! subscribes to `MessageType::ErrorReport` on the bus like any other type.

use postbridge_core::error::BridgeError;
use postbridge_core::protocol::{fresh_id, Envelope, ErrorReport, MessageType};

use crate::transport::TransportAdapter;

#[derive(Clone)]
pub struct ErrorChannel {
    transport: TransportAdapter,
}

impl ErrorChannel {
    pub fn new(transport: TransportAdapter) -> Self {
        Self { transport }
    }

    /// `{ type: "HANDLER_ERROR", message, details: { messageType } }`
    pub fn report_handler_failure(&self, failing: MessageType, reason: &str) -> String {
        self.report(ErrorReport::handler_failure(failing, reason))
    }

    /// Send an application-level report. Returns the envelope id.
    pub fn report(&self, report: ErrorReport) -> String {
        let id = fresh_id();
        self.transport.send_raw(&Envelope::with_id(id.clone(), report));
        id
    }

    /// Report a local error under its stable code.
    pub fn report_error(&self, err: &BridgeError) -> String {
        self.report(ErrorReport::from_error(err))
    }
}
