//! Byte-level text sanitization.
//!
//! DjVu text layers are byte strings that are supposed to be UTF-8 but often
//! are not, and they may carry C0 control characters that XML 1.0 forbids.

use log::warn;
use std::borrow::Cow;

/// Unicode replacement character.
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Check whether a character is a C0 control that cannot appear in XML 1.0.
///
/// Tab, line feed and carriage return are allowed and therefore excluded.
pub fn is_forbidden_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}')
}

/// Decode bytes as UTF-8, replacing invalid sequences.
///
/// Logs a warning when a replacement happened.
pub fn decode_utf8_lossy(bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => {
            if let Err(e) = std::str::from_utf8(bytes) {
                warn!("invalid UTF-8 in text layer: {}", e);
            }
            s
        }
    }
}

/// Replace invalid UTF-8 sequences and forbidden control characters with
/// U+FFFD.
///
/// CR, LF, TAB and space survive untouched. The output is always valid UTF-8.
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    let text = decode_utf8_lossy(bytes);
    replace_controls(&text)
}

/// Replace forbidden control characters in already-decoded text.
pub fn replace_controls(text: &str) -> String {
    if let Some((pos, c)) = text.char_indices().find(|&(_, c)| is_forbidden_control(c)) {
        warn!(
            "byte 0x{:02x} in position {}: control character",
            c as u32, pos
        );
        text.chars()
            .map(|c| {
                if is_forbidden_control(c) {
                    REPLACEMENT_CHARACTER
                } else {
                    c
                }
            })
            .collect()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_control_character() {
        assert_eq!(sanitize_utf8(b"a\x01b"), "a\u{FFFD}b");
    }

    #[test]
    fn test_sanitize_keeps_whitespace_controls() {
        assert_eq!(sanitize_utf8(b"a\nb\rc\td e"), "a\nb\rc\td e");
    }

    #[test]
    fn test_sanitize_invalid_utf8() {
        let result = sanitize_utf8(b"caf\xc3 \xff");
        assert_eq!(result, "caf\u{FFFD} \u{FFFD}");
    }

    #[test]
    fn test_sanitize_valid_multibyte() {
        assert_eq!(sanitize_utf8("żółw".as_bytes()), "żółw");
    }

    #[test]
    fn test_forbidden_control_set() {
        assert!(is_forbidden_control('\u{00}'));
        assert!(is_forbidden_control('\u{0B}'));
        assert!(is_forbidden_control('\u{1F}'));
        assert!(!is_forbidden_control('\t'));
        assert!(!is_forbidden_control('\n'));
        assert!(!is_forbidden_control('\r'));
        assert!(!is_forbidden_control(' '));
        assert!(!is_forbidden_control('\u{7F}'));
    }
}
