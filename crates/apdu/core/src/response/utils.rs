//! Utility functions for response frame handling

use crate::response::error::ResponseError;
use crate::response::status::StatusWord;
use tracing::debug;

/// Split raw response data into its status word and payload
///
/// # Errors
/// Returns an error if the data is too short to contain a status word.
pub fn extract_status_and_payload(data: &[u8]) -> Result<(StatusWord, &[u8]), ResponseError> {
    match data {
        [payload @ .., sw1, sw2] => Ok((StatusWord::new(*sw1, *sw2), payload)),
        _ => {
            debug!("Response too short: {} bytes", data.len());
            Err(ResponseError::Incomplete)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_status_and_payload() {
        let data = [0x01, 0x02, 0x03, 0x90, 0x00];
        let (status, payload) = extract_status_and_payload(&data).unwrap();
        assert_eq!(status, StatusWord::new(0x90, 0x00));
        assert_eq!(payload, &[0x01, 0x02, 0x03]);

        let data = [0x6E, 0x00];
        let (status, payload) = extract_status_and_payload(&data).unwrap();
        assert_eq!(status.to_u16(), 0x6E00);
        assert!(payload.is_empty());

        assert!(extract_status_and_payload(&[0x90]).is_err());
    }
}
