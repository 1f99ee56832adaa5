//! Transport trait for frame delivery
//!
//! A transport carries raw command bytes to a card and brings the raw response
//! back. It knows nothing about instructions or status words; one call is one
//! exchange.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for card transports
pub trait CardTransport: Send + fmt::Debug {
    /// Send raw command bytes to the card and return the raw response
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command_len = command.len(), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response_len = response.len(), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    ///
    /// Concrete transports implement this; callers go through `transmit_raw`.
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Check if the transport is connected to a card
    fn is_connected(&self) -> bool;

    /// Reset the connection, ending the card's current session
    fn reset(&mut self) -> Result<(), TransportError>;
}
