//! Base64 armor for byte sequences.
//!
//! Byte fields are carried as base64 text in the generic form unless the
//! `use_bytes` policy is set. The text layout follows MIME: lines of at most
//! 76 characters, each terminated by a newline.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

/// Maximum number of base64 characters per line.
pub const LINE_LENGTH: usize = 76;

/// Encodes bytes as line-wrapped base64 text.
#[must_use]
pub fn encode_bytes(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut output = String::with_capacity(encoded.len() + encoded.len() / LINE_LENGTH + 1);
    for chunk in encoded.as_bytes().chunks(LINE_LENGTH) {
        // base64 output is pure ASCII
        output.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        output.push('\n');
    }
    output
}

/// Decodes base64 text, ignoring embedded ASCII whitespace.
///
/// # Errors
/// Returns [`Error::InvalidValue`] if the text is not valid base64.
pub fn decode_bytes(text: &str) -> Result<Bytes> {
    let compact: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map(Bytes::from)
        .map_err(|e| Error::invalid_value("<bytes>", format!("invalid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_short() {
        assert_eq!(encode_bytes(b"hello"), "aGVsbG8=\n");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_bytes(b""), "");
        assert_eq!(decode_bytes("").unwrap(), Bytes::new());
    }

    #[test]
    fn test_encode_wraps_long_input() {
        let data = vec![0xABu8; 100];
        let text = encode_bytes(&data);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), LINE_LENGTH);
        assert!(text.ends_with('\n'));
        assert_eq!(decode_bytes(&text).unwrap(), Bytes::from(data));
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        assert_eq!(decode_bytes(" aGVs\nbG8=\n").unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_decode_invalid() {
        let err = decode_bytes("not base64!").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }
}
