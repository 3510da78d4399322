//! Typed shortcuts over `send` / `send_and_wait` for common message types.

use serde_json::{Map, Value};

use postbridge_core::error::{BridgeError, Result};
use postbridge_core::protocol::{
    DataRequest, DataResponse, Envelope, ErrorAcknowledge, ErrorReport, Lifecycle, Message,
    MessageType, StateRequest, StateUpdate, UserAction,
};

use crate::bus::Bus;

fn to_path<I, S>(path: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    path.into_iter().map(Into::into).collect()
}

impl Bus {
    pub fn send_state_update<I, S>(&self, path: I, value: Value) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(StateUpdate {
            path: to_path(path),
            value,
        })
    }

    pub fn send_state_request<I, S>(&self, path: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(StateRequest { path: to_path(path) })
    }

    pub fn send_user_action(&self, action: impl Into<String>, data: Option<Value>) -> String {
        self.send(UserAction {
            action: action.into(),
            data,
        })
    }

    /// `DATA_REQUEST` and wait for the matching `DATA_RESPONSE`.
    ///
    /// A response carrying an `error` block is still `Ok`; callers decide
    /// what a remote failure means for them.
    pub async fn request_data(
        &self,
        resource: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Result<DataResponse> {
        let reply = self
            .send_and_wait(DataRequest {
                resource: resource.into(),
                params,
            })
            .await?;

        match reply {
            Message::DataResponse(resp) => Ok(resp),
            other => Err(BridgeError::UnexpectedReply {
                expected: MessageType::DataResponse,
                got: other.message_type(),
            }),
        }
    }

    /// Answer a `DATA_REQUEST` envelope.
    pub fn send_data_response(
        &self,
        request: &Envelope,
        resource: impl Into<String>,
        data: Value,
        error: Option<ErrorReport>,
    ) -> String {
        self.reply(
            request,
            DataResponse {
                resource: resource.into(),
                data,
                error,
            },
        )
    }

    pub fn send_error(&self, report: ErrorReport) -> String {
        self.errors().report(report)
    }

    /// `ERROR_ACKNOWLEDGE` for a received error-report envelope.
    pub fn acknowledge_error(&self, report: &Envelope) -> String {
        self.send(ErrorAcknowledge {
            report_id: report.id().map(str::to_owned),
        })
    }

    pub fn notify_ready(&self) -> String {
        self.send(Message::WebviewReady(Lifecycle::now()))
    }

    pub fn notify_mounted(&self) -> String {
        self.send(Message::WebviewMounted(Lifecycle::now()))
    }
}
