//! GET PUBKEY command

use cardcrypt_apdu::{ApduCommand, ResponseFrame};
use cardcrypt_applet::constants::{cla, ins};
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;

use super::success_payload;
use crate::client::ClientError;

/// GET PUBKEY: the public key as PKCS#1 DER
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPublicKeyCommand;

impl ApduCommand for GetPublicKeyCommand {
    type Success = RsaPublicKey;
    type Error = ClientError;

    fn class(&self) -> u8 {
        cla::APPLET
    }

    fn instruction(&self) -> u8 {
        ins::GET_PUBKEY
    }

    fn parse_response(response: ResponseFrame) -> Result<RsaPublicKey, ClientError> {
        let der = success_payload(response)?;
        Ok(RsaPublicKey::from_pkcs1_der(&der)?)
    }
}
