//! Text detection and newline normalization for source files

/// Number of leading bytes inspected by [`looks_like_text`]
pub const TEXT_SAMPLE_SIZE: usize = 2048;

/// Heuristic binary check: a NUL byte or invalid UTF-8 in the sample means binary.
///
/// A multi-byte character cut off by the end of the sample is not an error.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(TEXT_SAMPLE_SIZE)];
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && sample.len() == TEXT_SAMPLE_SIZE,
    }
}

/// Replace `\r\n` and lone `\r` with `\n`
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Decode source bytes into normalized text.
///
/// Returns `None` for binary or non-UTF-8 content.
pub fn decode_source(bytes: &[u8]) -> Option<String> {
    if !looks_like_text(bytes) {
        return None;
    }
    let text = std::str::from_utf8(bytes).ok()?;
    Some(normalize_newlines(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nul_byte_is_binary() {
        assert!(!looks_like_text(b"int main() {\0}"));
        assert_eq!(decode_source(b"abc\0def"), None);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        assert!(!looks_like_text(&[0x66, 0x6f, 0xff, 0x6f]));
        assert_eq!(decode_source(&[0xc3, 0x28]), None);
    }

    #[test]
    fn test_sample_may_end_mid_character() {
        let mut bytes = vec![b'a'; TEXT_SAMPLE_SIZE - 1];
        bytes.extend_from_slice("é".as_bytes());
        assert!(looks_like_text(&bytes));
        assert!(decode_source(&bytes).is_some());
    }

    #[test]
    fn test_newlines_are_normalized() {
        assert_eq!(normalize_newlines("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(decode_source(b"x\r\ny").as_deref(), Some("x\ny"));
    }

    #[test]
    fn test_empty_file_is_text() {
        assert_eq!(decode_source(b"").as_deref(), Some(""));
    }
}
