//! GET KEYLENGTH command

use cardcrypt_apdu::{ApduCommand, ResponseFrame};
use cardcrypt_applet::constants::{cla, ins};

use super::fixed_payload;
use crate::client::ClientError;

/// GET KEYLENGTH: modulus size in bits
#[derive(Debug, Clone, Copy, Default)]
pub struct GetKeyLengthCommand;

impl ApduCommand for GetKeyLengthCommand {
    type Success = u16;
    type Error = ClientError;

    fn class(&self) -> u8 {
        cla::APPLET
    }

    fn instruction(&self) -> u8 {
        ins::GET_KEYLENGTH
    }

    fn expected_length(&self) -> Option<u8> {
        Some(2)
    }

    fn parse_response(response: ResponseFrame) -> Result<u16, ClientError> {
        fixed_payload::<2>(response, "key length").map(u16::from_be_bytes)
    }
}
