//! GET VERSION command

use cardcrypt_apdu::{ApduCommand, ResponseFrame};
use cardcrypt_applet::Version;
use cardcrypt_applet::constants::{cla, ins};

use super::fixed_payload;
use crate::client::ClientError;

/// GET VERSION: applet major and minor version
#[derive(Debug, Clone, Copy, Default)]
pub struct GetVersionCommand;

impl ApduCommand for GetVersionCommand {
    type Success = Version;
    type Error = ClientError;

    fn class(&self) -> u8 {
        cla::APPLET
    }

    fn instruction(&self) -> u8 {
        ins::GET_VERSION
    }

    fn expected_length(&self) -> Option<u8> {
        Some(2)
    }

    fn parse_response(response: ResponseFrame) -> Result<Version, ClientError> {
        fixed_payload::<2>(response, "version").map(Version::from)
    }
}
