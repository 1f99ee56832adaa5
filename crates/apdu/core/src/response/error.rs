//! Errors raised while reading a response frame

use super::status::StatusWord;

/// Card answered with something other than 9000
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Card returned {status} ({})", status.description())]
pub struct StatusError {
    /// Status word the card answered with
    pub status: StatusWord,
}

impl From<StatusWord> for StatusError {
    fn from(status: StatusWord) -> Self {
        Self { status }
    }
}

/// Response bytes that do not form a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    /// Fewer than the two trailing status bytes
    #[error("Response too short to carry a status word")]
    Incomplete,

    /// Failure status, see [`StatusError`]
    #[error(transparent)]
    Status(#[from] StatusError),
}
