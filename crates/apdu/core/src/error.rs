//! Crate-level error type
//!
//! Each layer (frames, responses, transports) has its own error; this type
//! aggregates them for callers that drive a whole exchange.

use crate::command::error::FrameError;
use crate::response::error::{ResponseError, StatusError};
use crate::transport::error::TransportError;

/// Result type for protocol operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error type that encompasses all protocol-level failures
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failed to carry the frame
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command frame could not be built or parsed
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Response frame could not be parsed
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Card answered with a non-success status word
    #[error(transparent)]
    Status(#[from] StatusError),
}

impl Error {
    /// The status word carried by this error, if the card produced one
    pub const fn status_word(&self) -> Option<crate::StatusWord> {
        match self {
            Self::Status(e) => Some(e.status),
            Self::Response(ResponseError::Status(e)) => Some(e.status),
            _ => None,
        }
    }
}
