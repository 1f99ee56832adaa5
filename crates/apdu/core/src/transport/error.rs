//! Error types specific to card transports

/// Transport error type
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No card to talk to
    #[error("Failed to connect to device")]
    Connection,

    /// Frame could not be delivered
    #[error("Failed to transmit data")]
    Transmission,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
