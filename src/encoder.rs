//! Base64 content encoding for inline `binaryContent` elements.
//!
//! The payload is encoded in one pass with the standard alphabet, then
//! re-wrapped into fixed-width lines joined by a newline and a fixed
//! indentation prefix, so the block lines up under its element once the
//! document is serialized.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;

/// Width of a wrapped base64 line
pub const LINE_WIDTH: usize = 80;

/// Separator placed between wrapped lines
pub const CONTINUATION_INDENT: &str = "\n              ";

/// Content encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Maximum characters per line (every line but the last is exactly this wide)
    pub line_width: usize,
    /// Text joining consecutive lines
    pub continuation_indent: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            line_width: LINE_WIDTH,
            continuation_indent: CONTINUATION_INDENT.to_string(),
        }
    }
}

/// An encoded payload ready to embed as character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContent {
    /// Wrapped and indented base64 text
    pub text: String,
    /// Length of the payload before encoding
    pub size: u64,
}

/// Encodes a payload with the default line width and indentation.
pub fn encode_content(data: &[u8]) -> EncodedContent {
    encode_content_with(data, &EncoderConfig::default())
}

/// Encodes a payload with explicit settings.
pub fn encode_content_with(data: &[u8], config: &EncoderConfig) -> EncodedContent {
    let encoded = STANDARD.encode(data);
    // base64 output is ASCII, so every byte index is a char boundary
    let width = config.line_width.max(1);
    let lines: Vec<&str> = (0..encoded.len())
        .step_by(width)
        .map(|start| &encoded[start..(start + width).min(encoded.len())])
        .collect();

    EncodedContent {
        text: lines.join(&config.continuation_indent),
        size: data.len() as u64,
    }
}

/// Decodes a wrapped content block back into the original bytes.
///
/// All whitespace is discarded before decoding, so indentation and line
/// breaks added on encoding (or by any formatter) are ignored.
pub fn decode_content(text: &str) -> Result<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_small_payload() {
        let content = encode_content(&[0x01, 0x02, 0x03]);
        assert_eq!(content.text, "AQID");
        assert_eq!(content.size, 3);
    }

    #[test]
    fn test_encode_empty_payload() {
        let content = encode_content(&[]);
        assert_eq!(content.text, "");
        assert_eq!(content.size, 0);
        assert_eq!(decode_content(&content.text).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_lines_wrap_at_width() {
        // 150 bytes encode to 200 characters: 80 + 80 + 40
        let data: Vec<u8> = (0..150u8).collect();
        let content = encode_content(&data);

        let lines: Vec<&str> = content.text.split(CONTINUATION_INDENT).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), LINE_WIDTH);
        assert_eq!(lines[1].len(), LINE_WIDTH);
        assert_eq!(lines[2].len(), 40);
        assert!(!content.text.ends_with(CONTINUATION_INDENT));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_separator() {
        // 60 bytes encode to exactly 80 characters
        let content = encode_content(&[0xAB; 60]);
        assert_eq!(content.text.len(), LINE_WIDTH);
        assert!(!content.text.contains('\n'));
    }

    #[test]
    fn test_decode_restores_payload() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let content = encode_content(&data);
        assert_eq!(decode_content(&content.text).unwrap(), data);

        let padded = format!("\n    {}\n    ", content.text);
        assert_eq!(decode_content(&padded).unwrap(), data);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let data = b"the same bytes twice".repeat(20);
        assert_eq!(encode_content(&data), encode_content(&data));
    }

    #[test]
    fn test_custom_config() {
        let config = EncoderConfig {
            line_width: 4,
            continuation_indent: "\n".to_string(),
        };
        let content = encode_content_with(b"abcdef", &config);
        assert_eq!(content.text, "YWJj\nZGVm");
    }

    #[test]
    fn test_wrapped_lines_cover_whole_encoding() {
        let data: Vec<u8> = (0..=255u8).cycle().take(301).collect();
        let content = encode_content(&data);
        let joined: String = content.text.split(CONTINUATION_INDENT).collect();
        assert_eq!(joined, STANDARD.encode(&data));
        assert_eq!(joined.len(), 404);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_content("not*base64").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidContent(_)));
    }
}
