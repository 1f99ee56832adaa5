//! DECRYPT command

use cardcrypt_apdu::command::{FrameError, MAX_PAYLOAD_LEN};
use cardcrypt_apdu::{ApduCommand, Bytes, ResponseFrame};
use cardcrypt_applet::constants::{cla, ins};

use super::success_payload;
use crate::client::ClientError;

/// DECRYPT one modulus-sized block with the card's private key
#[derive(Debug, Clone)]
pub struct DecryptCommand {
    cla: u8,
    block: Bytes,
}

impl DecryptCommand {
    /// Create a DECRYPT command for `block`
    pub fn new(block: impl Into<Bytes>) -> Result<Self, FrameError> {
        let block = block.into();
        if block.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::data_too_long(block.len(), MAX_PAYLOAD_LEN));
        }
        Ok(Self {
            cla: cla::APPLET,
            block,
        })
    }

    /// Send with a different class byte
    pub const fn with_class(mut self, cla: u8) -> Self {
        self.cla = cla;
        self
    }
}

impl ApduCommand for DecryptCommand {
    type Success = Bytes;
    type Error = ClientError;

    fn class(&self) -> u8 {
        self.cla
    }

    fn instruction(&self) -> u8 {
        ins::DECRYPT
    }

    fn data(&self) -> Option<&[u8]> {
        Some(&self.block)
    }

    fn parse_response(response: ResponseFrame) -> Result<Bytes, ClientError> {
        success_payload(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_decrypt_frame() {
        let command = DecryptCommand::new(hex!("0102 0304").to_vec()).unwrap();
        assert_eq!(&command.to_bytes().unwrap()[..], &hex!("8010000004 01020304"));

        let command = command.with_class(0x00);
        assert_eq!(command.to_frame().unwrap().cla, 0x00);
    }

    #[test]
    fn test_decrypt_block_too_long() {
        assert!(DecryptCommand::new(vec![0u8; 256]).is_err());
    }
}
