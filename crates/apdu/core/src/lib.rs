//! Core types for the cardcrypt applet protocol
//!
//! This crate holds the wire-level vocabulary shared by the card-resident
//! applet and the host-side tooling that talks to it:
//!
//! - Command frames: a 5-byte header (CLA, INS, P1, P2, length byte) and an optional payload
//! - Response frames: a payload followed by a two byte status word
//! - Status words, with the codes the applet emits
//! - The [`CardTransport`] seam over which raw frames travel, and an [`Executor`] on top of it
//!
//! Framing follows the short-length form of ISO/IEC 7816-4.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod executor;
pub mod response;
pub mod transport;

mod error;
pub use error::{Error, Result};

pub use command::{ApduCommand, CommandFrame};
pub use executor::{CardExecutor, Executor};
pub use response::ResponseFrame;
pub use response::status::StatusWord;
pub use transport::CardTransport;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, CommandFrame, Error, ResponseFrame, Result,
        command::ApduCommand,
        executor::{CardExecutor, Executor},
        response::status::{StatusWord, common as status},
        transport::{CardTransport, TransportError},
    };
}
