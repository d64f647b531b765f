#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("connect timed out after {0}s")]
    ConnectTimeout(u64),

    #[error("websocket error: {0}")]
    WebSocket(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("not connected")]
    NotConnected,

    #[error("no such server: {0}")]
    UnknownServer(String),

    #[error("message text is empty")]
    EmptyMessage,
}
