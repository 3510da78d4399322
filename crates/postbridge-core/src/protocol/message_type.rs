use std::fmt;

use serde::{Deserialize, Serialize};

/// Envelope tag. Serialized as `SCREAMING_SNAKE_CASE` (field name `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    StateUpdate,
    StateRequest,
    ErrorReport,
    ErrorAcknowledge,
    UserAction,
    ActionResponse,
    WebviewReady,
    WebviewMounted,
    DataRequest,
    DataResponse,
}

impl MessageType {
    /// Every tag, in declaration order.
    pub const ALL: [MessageType; 10] = [
        MessageType::StateUpdate,
        MessageType::StateRequest,
        MessageType::ErrorReport,
        MessageType::ErrorAcknowledge,
        MessageType::UserAction,
        MessageType::ActionResponse,
        MessageType::WebviewReady,
        MessageType::WebviewMounted,
        MessageType::DataRequest,
        MessageType::DataResponse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::StateUpdate => "STATE_UPDATE",
            MessageType::StateRequest => "STATE_REQUEST",
            MessageType::ErrorReport => "ERROR_REPORT",
            MessageType::ErrorAcknowledge => "ERROR_ACKNOWLEDGE",
            MessageType::UserAction => "USER_ACTION",
            MessageType::ActionResponse => "ACTION_RESPONSE",
            MessageType::WebviewReady => "WEBVIEW_READY",
            MessageType::WebviewMounted => "WEBVIEW_MOUNTED",
            MessageType::DataRequest => "DATA_REQUEST",
            MessageType::DataResponse => "DATA_RESPONSE",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
