use cardcrypt_apdu::StatusWord;
use cardcrypt_apdu::command::FrameError;
use cardcrypt_apdu::prelude::status;

use crate::access::DenialReason;

/// Result type for applet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for applet operations
///
/// Every variant maps to exactly one status word (see [`Error::status`]); the
/// dispatcher reports that word unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame could not be parsed at all
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Declared length does not match the payload received
    #[error("Framing error: declared {declared} bytes, received {received}")]
    Framing {
        /// Length byte of the frame
        declared: u8,
        /// Payload bytes actually received
        received: usize,
    },

    /// Instruction byte outside the command set
    #[error("Instruction {0:#04x} not supported")]
    UnsupportedInstruction(u8),

    /// Class byte other than the configured one
    #[error("Class {0:#04x} not supported")]
    UnsupportedClass(u8),

    /// No such child under the current selection
    #[error("Object {0:#06x} not found")]
    ObjectNotFound(u16),

    /// Operation needs a selected object
    #[error("No object selected")]
    NoSelection,

    /// Access evaluator refused the permission
    #[error("Access denied: {0}")]
    AccessDenied(DenialReason),

    /// Read beyond the end of the stored object
    #[error("Read of {length} bytes at offset {offset} exceeds object size {size}")]
    StorageReadOutOfRange {
        /// Requested offset
        offset: usize,
        /// Requested length
        length: usize,
        /// Stored size of the object
        size: usize,
    },

    /// Output buffer cannot hold the result
    #[error("Destination buffer too small: need {needed}, have {available}")]
    BufferTooSmall {
        /// Bytes needed
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Operation not applicable to the selected object
    #[error("Object {0:#06x} cannot be read as binary data")]
    CommandIncompatible(u16),

    /// Modulus size outside the supported set
    #[error("Unsupported key size: {0} bits")]
    InvalidKeySize(usize),

    /// Transform input is not exactly one block
    #[error("Block must be {expected} bytes, got {actual}")]
    BlockLength {
        /// Modulus length in bytes
        expected: usize,
        /// Block length supplied
        actual: usize,
    },

    /// Transform input is not smaller than the modulus
    #[error("Block value is not smaller than the modulus")]
    BlockOutOfRange,

    /// Transform used before a key was bound
    #[error("Private key transform not initialized")]
    NotInitialized,

    /// Failure inside the RSA backend
    #[error(transparent)]
    Crypto(#[from] rsa::Error),
}

impl Error {
    /// Status word reported for this error
    pub const fn status(&self) -> StatusWord {
        match self {
            Self::Frame(_) | Self::Framing { .. } | Self::BlockLength { .. } => {
                status::WRONG_LENGTH
            }
            Self::BufferTooSmall { .. } => status::WRONG_LENGTH,
            Self::UnsupportedInstruction(_) => status::INVALID_INSTRUCTION,
            Self::UnsupportedClass(_) => status::CLASS_NOT_SUPPORTED,
            Self::ObjectNotFound(_) => status::FILE_NOT_FOUND,
            Self::NoSelection => status::COMMAND_NOT_ALLOWED,
            Self::AccessDenied(reason) => reason.status(),
            Self::StorageReadOutOfRange { .. } => status::WRONG_P1P2,
            Self::CommandIncompatible(_) => status::COMMAND_INCOMPATIBLE,
            Self::InvalidKeySize(_) => status::FUNCTION_NOT_SUPPORTED,
            Self::BlockOutOfRange => status::INCORRECT_DATA,
            Self::NotInitialized => status::CONDITIONS_NOT_SATISFIED,
            Self::Crypto(_) => status::NO_PRECISE_DIAGNOSIS,
        }
    }
}
