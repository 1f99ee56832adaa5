//! Host-side client for the applet

use cardcrypt_apdu::{Bytes, Error, Executor, ResponseFrame, StatusWord};
use cardcrypt_applet::Version;
use rsa::RsaPublicKey;
use tracing::debug;
use zeroize::Zeroizing;

use crate::commands::*;

/// Errors surfaced by [`CardClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Exchange failed or the card returned an error status
    #[error(transparent)]
    Apdu(#[from] Error),

    /// Response payload had the wrong size
    #[error("Unexpected {what} length: expected {expected}, got {actual}")]
    UnexpectedLength {
        /// Field being decoded
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// Public key could not be decoded
    #[error("Invalid public key: {0}")]
    PublicKey(#[from] rsa::pkcs1::Error),

    /// Decrypted block does not carry PKCS#1 v1.5 encryption padding
    #[error("Invalid PKCS#1 v1.5 padding")]
    Padding,
}

impl ClientError {
    /// Status word returned by the card, if that is what failed
    pub const fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::Apdu(e) => e.status_word(),
            _ => None,
        }
    }
}

impl From<cardcrypt_apdu::command::FrameError> for ClientError {
    fn from(error: cardcrypt_apdu::command::FrameError) -> Self {
        Self::Apdu(error.into())
    }
}

/// Typed access to an applet over any [`Executor`]
#[derive(Debug)]
pub struct CardClient<E: Executor> {
    executor: E,
    cla: u8,
}

impl<E: Executor> CardClient<E> {
    /// Create a client using the default applet class
    pub const fn new(executor: E) -> Self {
        Self {
            executor,
            cla: cardcrypt_applet::constants::cla::APPLET,
        }
    }

    /// Use `cla` for DECRYPT
    pub const fn with_class(mut self, cla: u8) -> Self {
        self.cla = cla;
        self
    }

    /// Underlying executor
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Take back the executor
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Select the applet
    pub fn select(&mut self) -> Result<(), ClientError> {
        self.executor.execute(&SelectCommand)
    }

    /// Applet version
    pub fn version(&mut self) -> Result<Version, ClientError> {
        self.executor.execute(&GetVersionCommand)
    }

    /// Modulus size in bits
    pub fn key_length(&mut self) -> Result<u16, ClientError> {
        self.executor.execute(&GetKeyLengthCommand)
    }

    /// Public key held by the card
    pub fn public_key(&mut self) -> Result<RsaPublicKey, ClientError> {
        self.executor.execute(&GetPublicKeyCommand)
    }

    /// Pending response data
    pub fn get_response(&mut self) -> Result<Bytes, ClientError> {
        self.executor.execute(&GetResponseCommand)
    }

    /// Raw private key transform of one block
    pub fn decrypt(&mut self, block: &[u8]) -> Result<Zeroizing<Vec<u8>>, ClientError> {
        let command = DecryptCommand::new(block.to_vec())?.with_class(self.cla);
        let plain = self.executor.execute(&command)?;
        debug!(len = plain.len(), "Block decrypted");
        Ok(Zeroizing::new(plain.to_vec()))
    }

    /// Decrypt a PKCS#1 v1.5 ciphertext and strip its padding
    pub fn decrypt_pkcs1(&mut self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, ClientError> {
        let block = self.decrypt(ciphertext)?;
        let message = unpad_pkcs1(&block)?;
        Ok(Zeroizing::new(message.to_vec()))
    }

    /// Send raw frame bytes and parse whatever comes back
    pub fn send_raw(&mut self, raw: &[u8]) -> Result<ResponseFrame, ClientError> {
        let response = self.executor.transmit(raw)?;
        Ok(ResponseFrame::from_bytes(&response).map_err(Error::from)?)
    }
}

/// Strip PKCS#1 v1.5 encryption padding: `00 02 PS 00 M` with at least 8 bytes of PS
fn unpad_pkcs1(block: &[u8]) -> Result<&[u8], ClientError> {
    let [0x00, 0x02, rest @ ..] = block else {
        return Err(ClientError::Padding);
    };
    match rest.iter().position(|b| *b == 0x00) {
        Some(separator) if separator >= 8 => Ok(&rest[separator + 1..]),
        _ => Err(ClientError::Padding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardcrypt_apdu::CardExecutor;
    use cardcrypt_applet::{Applet, AppletConfig, Condition, VirtualCard};
    use hex_literal::hex;
    use rand_v8::SeedableRng;
    use rand_v8::rngs::StdRng;
    use rsa::traits::PublicKeyParts;
    use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};

    fn key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut StdRng::seed_from_u64(0x1012), 768).unwrap()
    }

    fn client(key: &RsaPrivateKey, config: AppletConfig) -> CardClient<CardExecutor<VirtualCard>> {
        let applet = Applet::install(key.clone(), config).unwrap();
        CardClient::new(CardExecutor::new(VirtualCard::new(applet)))
    }

    #[test]
    fn test_client_over_virtual_card() {
        let key = key();
        let mut client = client(&key, AppletConfig::default());

        client.select().unwrap();
        assert_eq!(client.version().unwrap(), Version { major: 1, minor: 0 });
        assert_eq!(client.key_length().unwrap(), 768);
        assert!(client.get_response().unwrap().is_empty());

        let public = client.public_key().unwrap();
        assert_eq!(public, key.to_public_key());
        assert_eq!(public.size(), 96);

        let mut rng = StdRng::seed_from_u64(1);
        let ciphertext = public.encrypt(&mut rng, Pkcs1v15Encrypt, b"over the wire").unwrap();
        let message = client.decrypt_pkcs1(&ciphertext).unwrap();
        assert_eq!(&message[..], b"over the wire");
    }

    #[test]
    fn test_client_surfaces_status() {
        let config = AppletConfig {
            execute: Some(Condition::Never),
            ..Default::default()
        };
        let mut client = client(&key(), config);

        let err = client.decrypt(&[0x01; 96]).unwrap_err();
        assert_eq!(err.status_word().map(|sw| sw.to_u16()), Some(0x6982));

        let mut client = client.with_class(0x00);
        let err = client.decrypt(&[0x01; 96]).unwrap_err();
        assert_eq!(err.status_word().map(|sw| sw.to_u16()), Some(0x6E00));
    }

    #[test]
    fn test_send_raw() {
        let mut client = client(&key(), AppletConfig::default());
        let response = client.send_raw(&hex!("80FF000000")).unwrap();
        assert_eq!(response.status().to_u16(), 0x6D00);
        assert!(response.payload().is_empty());
    }

    #[test]
    fn test_unpad_pkcs1() {
        let block = hex!("0002 0101010101010101 00 6869");
        assert_eq!(unpad_pkcs1(&block).unwrap(), b"hi");

        // Padding string shorter than 8 bytes
        assert!(unpad_pkcs1(&hex!("0002 01010101 00 6869")).is_err());
        assert!(unpad_pkcs1(&hex!("0001 0101010101010101 00 6869")).is_err());
        assert!(unpad_pkcs1(&hex!("0002 0101010101010101")).is_err());
    }
}
