use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid command source endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to connect websocket: {endpoint}")]
    Connect {
        endpoint: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("websocket receive failed: {0}")]
    Receive(#[source] Box<tungstenite::Error>),
    #[error("websocket send failed: {0}")]
    Send(#[source] Box<tungstenite::Error>),
    /// For [`Connector`](crate::Connector) implementations whose failure is
    /// not a websocket error, such as a source that refuses or is not yet up.
    #[error("command source unavailable: {0}")]
    Unavailable(String),
}
