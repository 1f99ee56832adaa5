//! Typed commands of the applet protocol

pub mod decrypt;
pub use decrypt::*;
pub mod get_key_length;
pub use get_key_length::*;
pub mod get_public_key;
pub use get_public_key::*;
pub mod get_response;
pub use get_response::*;
pub mod get_version;
pub use get_version::*;
pub mod select;
pub use select::*;

use cardcrypt_apdu::{Bytes, ResponseFrame};

use crate::client::ClientError;

/// Payload of a successful response, or the card's status as an error
pub(crate) fn success_payload(response: ResponseFrame) -> Result<Bytes, ClientError> {
    response
        .into_payload_result()
        .map_err(|e| ClientError::Apdu(e.into()))
}

/// Payload of a successful response that must be exactly `N` bytes long
pub(crate) fn fixed_payload<const N: usize>(
    response: ResponseFrame,
    what: &'static str,
) -> Result<[u8; N], ClientError> {
    let payload = success_payload(response)?;
    <[u8; N]>::try_from(&payload[..]).map_err(|_| ClientError::UnexpectedLength {
        what,
        expected: N,
        actual: payload.len(),
    })
}
