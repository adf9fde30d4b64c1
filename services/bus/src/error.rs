//! Bus error taxonomy

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("bus connection closed")]
    Closed,

    #[error("invalid topic: {0:?}")]
    InvalidTopic(String),

    #[error("encode error: {0}")]
    Encode(String),
}
