//! In-process card hosting one applet
//!
//! [`VirtualCard`] is a [`CardTransport`] whose far end is an [`Applet`] in
//! the same process. Clones share the applet; each exchange holds its lock for
//! the whole command, so exchanges from different handles never interleave.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use cardcrypt_apdu::CardTransport;
use cardcrypt_apdu::transport::TransportError;
use parking_lot::Mutex;
use tracing::debug;

use crate::access::{AccessEvaluator, RuleEvaluator};
use crate::applet::Applet;
use crate::transform::{PrivateKeyTransform, RsaTransform};

/// Card transport backed by an in-process applet
pub struct VirtualCard<T = RsaTransform, A = RuleEvaluator> {
    applet: Arc<Mutex<Applet<T, A>>>,
    connected: bool,
}

impl<T, A> VirtualCard<T, A> {
    /// Insert `applet` into a new card
    pub fn new(applet: Applet<T, A>) -> Self {
        Self {
            applet: Arc::new(Mutex::new(applet)),
            connected: true,
        }
    }

    /// Shared handle to the hosted applet
    pub const fn applet(&self) -> &Arc<Mutex<Applet<T, A>>> {
        &self.applet
    }

    /// Drop the connection; exchanges fail until [`CardTransport::reset`]
    pub fn disconnect(&mut self) {
        self.connected = false;
    }
}

impl<T, A> Clone for VirtualCard<T, A> {
    fn clone(&self) -> Self {
        Self {
            applet: Arc::clone(&self.applet),
            connected: self.connected,
        }
    }
}

impl<T, A> fmt::Debug for VirtualCard<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualCard")
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl<T, A> CardTransport for VirtualCard<T, A>
where
    T: PrivateKeyTransform,
    A: AccessEvaluator,
{
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if !self.connected {
            return Err(TransportError::Connection);
        }
        Ok(self.applet.lock().process(command))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.applet.lock().deselect();
        self.connected = true;
        debug!("Virtual card reset");
        Ok(())
    }
}
