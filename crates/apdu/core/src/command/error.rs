//! Error types specific to command frames

/// Error raised while building or parsing a command frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Frame is shorter than the 4 mandatory header bytes
    #[error("Invalid frame length: {0}")]
    InvalidLength(usize),

    /// Payload does not fit the single length byte
    #[error("Data too long: {0} bytes (max {1})")]
    DataTooLong(usize, usize),
}

impl FrameError {
    /// Create a data too long error
    pub const fn data_too_long(actual: usize, max: usize) -> Self {
        Self::DataTooLong(actual, max)
    }
}
