//! Ciphertext framing.
//!
//! # Wire Format
//!
//! ```text
//! AES-GCM:  [1 byte iv length][iv][ciphertext + 16 byte tag]
//! RSA/ECB:  [ciphertext]
//! ```
//!
//! The framed bytes are stored as standard, padded base64 text.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{PrefsafeError, Result};

/// Largest IV the one-byte length prefix can describe.
pub const MAX_IV_LEN: usize = u8::MAX as usize;

/// Borrowed view of an IV-prefixed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedPayload<'a> {
    /// Initialization vector.
    pub iv: &'a [u8],
    /// Ciphertext including any authentication tag.
    pub ciphertext: &'a [u8],
}

/// Build `[len(iv)][iv][ciphertext]`.
pub fn frame(iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() > MAX_IV_LEN {
        return Err(PrefsafeError::Internal(format!(
            "iv of {} bytes does not fit the length prefix",
            iv.len()
        )));
    }
    let mut payload = Vec::with_capacity(1 + iv.len() + ciphertext.len());
    payload.push(iv.len() as u8);
    payload.extend_from_slice(iv);
    payload.extend_from_slice(ciphertext);
    Ok(payload)
}

/// Split an IV-prefixed payload.
///
/// Fails with [`PrefsafeError::MalformedPayload`] when the buffer is empty
/// or shorter than the IV length it declares.
pub fn parse(payload: &[u8]) -> Result<FramedPayload<'_>> {
    let (&iv_len, rest) = payload
        .split_first()
        .ok_or_else(|| PrefsafeError::malformed(1, 0))?;
    let iv_len = usize::from(iv_len);
    if rest.len() < iv_len {
        return Err(PrefsafeError::malformed(1 + iv_len, payload.len()));
    }
    let (iv, ciphertext) = rest.split_at(iv_len);
    Ok(FramedPayload { iv, ciphertext })
}

/// Encode a payload as store text.
pub fn to_text(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

/// Decode store text into a payload. Line breaks are ignored.
pub fn from_text(text: &str) -> Result<Vec<u8>> {
    if text.contains(['\n', '\r']) {
        let compact: String = text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
        return Ok(STANDARD.decode(compact)?);
    }
    Ok(STANDARD.decode(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let payload = frame(&[1, 2, 3], &[9, 9]).unwrap();
        assert_eq!(payload, vec![3, 1, 2, 3, 9, 9]);

        let parsed = parse(&payload).unwrap();
        assert_eq!(parsed.iv, &[1, 2, 3]);
        assert_eq!(parsed.ciphertext, &[9, 9]);
    }

    #[test]
    fn test_empty_ciphertext_is_allowed() {
        let parsed = parse(&[2, 7, 7]).unwrap();
        assert_eq!(parsed.iv, &[7, 7]);
        assert!(parsed.ciphertext.is_empty());
    }

    #[test]
    fn test_short_payloads_are_malformed() {
        let err = parse(&[]).unwrap_err();
        assert!(matches!(err, PrefsafeError::MalformedPayload { needed: 1, actual: 0 }));

        let err = parse(&[12, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, PrefsafeError::MalformedPayload { needed: 13, actual: 4 }));
    }

    #[test]
    fn test_oversized_iv_rejected() {
        assert!(frame(&[0u8; 256], b"x").is_err());
    }

    #[test]
    fn test_text_wrapping() {
        let text = to_text(&[0, 255, 16]);
        assert_eq!(text, "AP8Q");
        assert_eq!(from_text(&text).unwrap(), vec![0, 255, 16]);
        assert_eq!(from_text("AP8Q\n").unwrap(), vec![0, 255, 16]);
        assert!(from_text("not base64!").is_err());
    }
}
