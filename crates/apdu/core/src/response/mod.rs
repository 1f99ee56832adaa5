//! Response frame definitions
//!
//! A response frame is `0..N` payload bytes followed by the status word
//! (SW1, SW2). `90 00` denotes success.

pub mod error;
pub mod status;
pub mod utils;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use error::{ResponseError, StatusError};
use status::StatusWord;

/// One outbound protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Response payload
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl ResponseFrame {
    /// Create a new response with payload and status
    pub fn new(payload: Bytes, status: impl Into<StatusWord>) -> Self {
        Self {
            payload,
            status: status.into(),
        }
    }

    /// Create a success response
    pub const fn success(payload: Bytes) -> Self {
        Self {
            payload,
            status: status::common::SUCCESS,
        }
    }

    /// Create a success response without payload
    pub const fn ok() -> Self {
        Self::success(Bytes::new())
    }

    /// Create an error response; error responses never carry payload
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self {
            payload: Bytes::new(),
            status: status.into(),
        }
    }

    /// Parse a response from raw bytes (payload followed by the status word)
    pub fn from_bytes(data: &[u8]) -> Result<Self, ResponseError> {
        let (status, payload) = utils::extract_status_and_payload(data)?;

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed response frame"
        );

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            status,
        })
    }

    /// Get the response payload
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Convert to the payload on success, or the status as an error
    pub fn into_payload_result(self) -> Result<Bytes, StatusError> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(StatusError::from(self.status))
        }
    }

    /// Serialize to raw bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.payload.len() + 2);
        buf.put_slice(&self.payload);
        buf.put_u8(self.status.sw1);
        buf.put_u8(self.status.sw2);
        buf.freeze()
    }
}

impl TryFrom<&[u8]> for ResponseFrame {
    type Error = ResponseError;

    fn try_from(data: &[u8]) -> Result<Self, ResponseError> {
        Self::from_bytes(data)
    }
}

impl From<ResponseFrame> for Bytes {
    fn from(response: ResponseFrame) -> Self {
        response.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_response_from_bytes() {
        let resp = ResponseFrame::from_bytes(&hex!("0400 9000")).unwrap();
        assert_eq!(&resp.payload()[..], hex!("0400"));
        assert!(resp.is_success());

        let resp = ResponseFrame::from_bytes(&hex!("6D00")).unwrap();
        assert!(resp.payload().is_empty());
        assert_eq!(resp.status(), status::common::INVALID_INSTRUCTION);

        assert!(matches!(
            ResponseFrame::from_bytes(&hex!("90")),
            Err(ResponseError::Incomplete)
        ));
    }

    #[test]
    fn test_response_to_bytes() {
        let resp = ResponseFrame::success(Bytes::copy_from_slice(&hex!("0102")));
        assert_eq!(&resp.to_bytes()[..], hex!("0102 9000"));

        let resp = ResponseFrame::error((0x6A, 0x82));
        assert_eq!(&Bytes::from(resp)[..], hex!("6A82"));
    }

    #[test]
    fn test_response_into_result() {
        let success = ResponseFrame::success(Bytes::from_static(&[0x01, 0x00]));
        assert_eq!(&success.into_payload_result().unwrap()[..], &[0x01, 0x00]);

        let error = ResponseFrame::error(0x6982u16);
        let err = error.into_payload_result().unwrap_err();
        assert_eq!(err.status.to_u16(), 0x6982);
    }
}
