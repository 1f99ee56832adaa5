//! Executor for command exchanges
//!
//! An executor sits on top of a [`CardTransport`] and turns raw exchanges
//! into typed ones: it serializes [`ApduCommand`]s, parses the returned
//! [`ResponseFrame`] and hands it to the command's own response parser.

use core::fmt;

use bytes::Bytes;
use tracing::{debug, instrument, trace};

use crate::command::{ApduCommand, CommandFrame};
use crate::response::ResponseFrame;
use crate::transport::CardTransport;
use crate::{Error, Result};

/// Trait for command execution
pub trait Executor: Send + fmt::Debug {
    /// Transmit raw command bytes and return the raw response
    #[instrument(level = "trace", skip_all, fields(executor = std::any::type_name::<Self>()))]
    fn transmit(&mut self, command: &[u8]) -> Result<Bytes> {
        let response = self.do_transmit(command);
        match &response {
            Ok(bytes) => {
                trace!(response_len = bytes.len(), "Received response");
            }
            Err(err) => {
                debug!(error = ?err, "Error during transmission");
            }
        }
        response
    }

    /// Internal implementation of transmit
    fn do_transmit(&mut self, command: &[u8]) -> Result<Bytes>;

    /// Exchange one command frame for one response frame
    fn exchange(&mut self, frame: &CommandFrame) -> Result<ResponseFrame> {
        let response = self.transmit(&frame.to_bytes())?;
        Ok(ResponseFrame::from_bytes(&response)?)
    }

    /// Execute a typed command
    fn execute<C: ApduCommand>(&mut self, command: &C) -> core::result::Result<C::Success, C::Error> {
        let frame = command.to_frame().map_err(crate::Error::from)?;
        let response = self.exchange(&frame)?;
        C::parse_response(response)
    }

    /// Reset the executor, including the transport
    fn reset(&mut self) -> Result<()>;
}

/// Executor over a single card transport
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport> {
    /// The transport used for communication
    transport: T,
    /// The last response received
    last_response: Option<Bytes>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Create a new card executor with the given transport
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            last_response: None,
        }
    }

    /// Get a reference to the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take ownership of the transport and return it
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Get the last response received
    pub const fn last_response(&self) -> Option<&Bytes> {
        self.last_response.as_ref()
    }
}

impl<T: CardTransport> Executor for CardExecutor<T> {
    fn do_transmit(&mut self, command: &[u8]) -> Result<Bytes> {
        let response = self.transport.transmit_raw(command)?;
        self.last_response = Some(response.clone());
        Ok(response)
    }

    fn reset(&mut self) -> Result<()> {
        self.last_response = None;
        self.transport.reset().map_err(Error::from)
    }
}
