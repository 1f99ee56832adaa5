//! GET RESPONSE command

use cardcrypt_apdu::{ApduCommand, Bytes, ResponseFrame};
use cardcrypt_applet::constants::{cla, ins};

use super::success_payload;
use crate::client::ClientError;

/// GET RESPONSE; the applet never has pending data, so the payload is empty
#[derive(Debug, Clone, Copy, Default)]
pub struct GetResponseCommand;

impl ApduCommand for GetResponseCommand {
    type Success = Bytes;
    type Error = ClientError;

    fn class(&self) -> u8 {
        cla::ISO7816
    }

    fn instruction(&self) -> u8 {
        ins::GET_RESPONSE
    }

    fn parse_response(response: ResponseFrame) -> Result<Bytes, ClientError> {
        success_payload(response)
    }
}
