//! SELECT command

use cardcrypt_apdu::{ApduCommand, ResponseFrame};
use cardcrypt_applet::constants::{cla, ins};

use super::success_payload;
use crate::client::ClientError;

/// SELECT the applet by name
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectCommand;

impl ApduCommand for SelectCommand {
    type Success = ();
    type Error = ClientError;

    fn class(&self) -> u8 {
        cla::ISO7816
    }

    fn instruction(&self) -> u8 {
        ins::SELECT
    }

    fn p1(&self) -> u8 {
        // Select by name
        0x04
    }

    fn parse_response(response: ResponseFrame) -> Result<(), ClientError> {
        success_payload(response).map(drop)
    }
}
