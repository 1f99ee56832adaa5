//! Command frame definitions and traits
//!
//! A command frame is a 5-byte header (CLA, INS, P1, P2 and a single length
//! byte) followed by an optional payload. The length byte declares the payload
//! length for commands that carry data, and the expected response length for
//! those that don't. [`CommandFrame`] keeps the declared length and the payload
//! actually received apart, so that the receiver can reject inconsistent frames.

pub mod error;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

pub use error::FrameError;

use crate::ResponseFrame;

/// Length of the frame header, including the length byte
pub const HEADER_LEN: usize = 5;

/// Largest payload a single length byte can declare
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Core trait for typed commands
pub trait ApduCommand {
    /// Success response type
    type Success;

    /// Error response type
    type Error: fmt::Debug + From<crate::Error>;

    /// Command class (CLA)
    fn class(&self) -> u8;

    /// Instruction code (INS)
    fn instruction(&self) -> u8;

    /// First parameter (P1)
    fn p1(&self) -> u8 {
        0x00
    }

    /// Second parameter (P2)
    fn p2(&self) -> u8 {
        0x00
    }

    /// Command payload (optional)
    fn data(&self) -> Option<&[u8]> {
        None
    }

    /// Expected response length, sent in the length byte when there is no payload
    fn expected_length(&self) -> Option<u8> {
        None
    }

    /// Build the command frame
    ///
    /// Fails with [`FrameError::DataTooLong`] when the payload does not fit
    /// the length byte.
    fn to_frame(&self) -> Result<CommandFrame, FrameError> {
        let (p3, data) = match self.data() {
            Some(data) => {
                let p3 = u8::try_from(data.len())
                    .map_err(|_| FrameError::data_too_long(data.len(), MAX_PAYLOAD_LEN))?;
                (p3, Bytes::copy_from_slice(data))
            }
            None => (self.expected_length().unwrap_or(0), Bytes::new()),
        };

        Ok(CommandFrame {
            cla: self.class(),
            ins: self.instruction(),
            p1: self.p1(),
            p2: self.p2(),
            p3,
            data,
        })
    }

    /// Convert to raw frame bytes
    fn to_bytes(&self) -> Result<Bytes, FrameError> {
        Ok(self.to_frame()?.to_bytes())
    }

    /// Parse a response frame into the command's success type
    fn parse_response(response: ResponseFrame) -> Result<Self::Success, Self::Error>;

    /// Parse raw response bytes into the command's success type
    fn parse_response_raw(bytes: &[u8]) -> Result<Self::Success, Self::Error> {
        let response = ResponseFrame::from_bytes(bytes).map_err(crate::Error::from)?;
        Self::parse_response(response)
    }
}

/// One inbound protocol message
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame {
    /// Class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Length byte as declared by the sender
    pub p3: u8,
    /// Payload bytes as received
    pub data: Bytes,
}

impl CommandFrame {
    /// Create a frame with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            p3: 0,
            data: Bytes::new(),
        }
    }

    /// Create a frame carrying a payload, declaring its exact length
    pub fn new_with_data<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
    ) -> Result<Self, FrameError> {
        let data = data.into();
        if data.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::data_too_long(data.len(), MAX_PAYLOAD_LEN));
        }

        Ok(Self {
            cla,
            ins,
            p1,
            p2,
            p3: data.len() as u8,
            data,
        })
    }

    /// Override the length byte
    pub const fn with_p3(mut self, p3: u8) -> Self {
        self.p3 = p3;
        self
    }

    /// Length declared in the header
    pub const fn declared_length(&self) -> u8 {
        self.p3
    }

    /// Payload bytes actually received
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    /// Whether the declared length matches the payload received
    pub fn has_consistent_length(&self) -> bool {
        usize::from(self.p3) == self.data.len()
    }

    /// Parse a frame from raw bytes
    ///
    /// Everything after the header is taken as payload, regardless of what the
    /// length byte claims. A 4-byte frame is read with a declared length of 0.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < HEADER_LEN - 1 {
            return Err(FrameError::InvalidLength(raw.len()));
        }

        let mut frame = Self::new(raw[0], raw[1], raw[2], raw[3]);
        if raw.len() >= HEADER_LEN {
            frame.p3 = raw[4];
            frame.data = Bytes::copy_from_slice(&raw[HEADER_LEN..]);
        }

        trace!(
            cla = format_args!("{:#04x}", frame.cla),
            ins = format_args!("{:#04x}", frame.ins),
            declared = frame.p3,
            received = frame.data.len(),
            "Parsed command frame"
        );

        Ok(frame)
    }

    /// Serialize to raw bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(HEADER_LEN + self.data.len());
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);
        buffer.put_u8(self.p3);
        buffer.put_slice(&self.data);
        buffer.freeze()
    }
}

// Payloads may carry ciphertext, keep them out of debug output
impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("cla", &format_args!("{:#04x}", self.cla))
            .field("ins", &format_args!("{:#04x}", self.ins))
            .field("p1", &format_args!("{:#04x}", self.p1))
            .field("p2", &format_args!("{:#04x}", self.p2))
            .field("p3", &self.p3)
            .field("data_len", &self.data.len())
            .finish()
    }
}
