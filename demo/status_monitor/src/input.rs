// JSON-lines transport stand-in
//
// Each stdin line is either a channel event
//   {"channel":"newGPSReading","data":{...}}
// a connection signal
//   {"transport":"closed"} / {"transport":"retrying","attempt":2}
// or a request error reported by the transport
//   {"error":{"code":"UNAUTHENTICATED","message":"jwt expired"}} / {"error":{"network":"timeout"}}
use serde::Deserialize;
use tidewatch_core::transport::{GraphQlErrorCode, TransportError};
use tidewatch_core::{ChannelEvent, TidewatchError, TransportSignal};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransportMessage {
    Event(ChannelEvent),
    Signal(TransportSignal),
    Error { error: ErrorBody },
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
}

impl From<ErrorBody> for TransportError {
    fn from(body: ErrorBody) -> Self {
        match body {
            ErrorBody {
                network: Some(reason),
                ..
            } => TransportError::Network(reason),
            ErrorBody {
                code: None,
                message: None,
                ..
            } => TransportError::Unknown,
            ErrorBody { code, message, .. } => TransportError::GraphQl {
                code: code.as_deref().map(GraphQlErrorCode::parse),
                message: message.unwrap_or_default(),
            },
        }
    }
}

pub fn parse_line(line: &str) -> Result<Option<TransportMessage>, TidewatchError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| TidewatchError::TransportError(format!("malformed message: {}", e)))
}
