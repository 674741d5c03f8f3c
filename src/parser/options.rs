//! Parsing options and configuration.

/// Options for reading the page dump.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// How to react when the dump ends before every requested page
    pub error_mode: ErrorMode,

    /// Replace control characters in zone text with U+FFFD while reading
    pub sanitize_text: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Treat a truncated dump as graceful completion.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Report a truncated dump as an error once the footer is written.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable control-character sanitization of zone text.
    pub fn with_sanitize_text(mut self, sanitize: bool) -> Self {
        self.sanitize_text = sanitize;
        self
    }
}

/// What a page stream that stops early means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Finish the document with the pages read so far
    #[default]
    Lenient,
    /// Finish the document, then fail with `Error::Truncated`
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new().strict().with_sanitize_text(true);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.sanitize_text);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.sanitize_text);
    }
}
