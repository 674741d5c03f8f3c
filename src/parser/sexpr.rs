//! Streaming s-expression reader.
//!
//! Reads the subset of the djvulibre s-expression syntax that `djvused`
//! emits: bare symbols, signed integers, double-quoted strings with C-style
//! escapes, parenthesized lists and `;` line comments.

use crate::error::{Error, Result};
use crate::text::{decode_utf8_lossy, sanitize_utf8};
use std::fmt;
use std::io::{BufRead, ErrorKind};

/// A parsed s-expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A bare token that is not an integer
    Symbol(String),
    /// An optionally signed decimal integer
    Integer(i64),
    /// A double-quoted string, escapes already resolved
    String(String),
    /// A parenthesized sequence
    List(Vec<Value>),
}

impl Value {
    /// Get the symbol name if this is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string contents if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the items if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Check if this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Symbol(_) => "symbol",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Symbol(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Value::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Reads one expression at a time from a byte stream.
///
/// After [`Reader::read`] returns, the stream is positioned immediately after
/// the expression, so consecutive expressions can be pulled from a pipe as
/// they arrive.
pub struct Reader<R> {
    inner: R,
    offset: u64,
    sanitize_text: bool,
}

impl<R: BufRead> Reader<R> {
    /// Create a reader over a buffered stream.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            offset: 0,
            sanitize_text: false,
        }
    }

    /// Replace control characters in decoded strings with U+FFFD.
    pub fn with_sanitize_text(mut self, sanitize: bool) -> Self {
        self.sanitize_text = sanitize;
        self
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Consume the reader and return the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next expression.
    ///
    /// Returns `Ok(None)` when the stream ends before any token of a new
    /// expression; ending inside an expression is [`Error::UnexpectedEof`].
    pub fn read(&mut self) -> Result<Option<Value>> {
        self.skip_blank()?;
        if self.peek()?.is_none() {
            return Ok(None);
        }
        self.read_value().map(Some)
    }

    fn read_value(&mut self) -> Result<Value> {
        self.skip_blank()?;
        match self.peek()? {
            None => Err(self.eof()),
            Some(b'(') => {
                self.bump()?;
                self.read_list()
            }
            Some(b')') => Err(self.syntax("unbalanced ')'")),
            Some(b'"') => {
                self.bump()?;
                self.read_string()
            }
            Some(_) => self.read_atom(),
        }
    }

    fn read_list(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        loop {
            self.skip_blank()?;
            match self.peek()? {
                None => return Err(self.eof()),
                Some(b')') => {
                    self.bump()?;
                    return Ok(Value::List(items));
                }
                Some(_) => items.push(self.read_value()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<Value> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.bump()?.ok_or_else(|| self.eof())?;
            match byte {
                b'"' => break,
                b'\\' => {
                    if let Some(b) = self.read_escape()? {
                        bytes.push(b);
                    }
                }
                b => bytes.push(b),
            }
        }
        let text = if self.sanitize_text {
            sanitize_utf8(&bytes)
        } else {
            decode_utf8_lossy(&bytes)
        };
        Ok(Value::String(text))
    }

    /// Resolve the escape after a backslash. `None` is a line continuation.
    fn read_escape(&mut self) -> Result<Option<u8>> {
        let byte = self.bump()?.ok_or_else(|| self.eof())?;
        let resolved = match byte {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0B,
            b'f' => 0x0C,
            b'r' => b'\r',
            b'\n' => return Ok(None),
            b'0'..=b'7' => {
                let mut value = u32::from(byte - b'0');
                for _ in 0..2 {
                    match self.peek()? {
                        Some(d @ b'0'..=b'7') => {
                            self.bump()?;
                            value = value * 8 + u32::from(d - b'0');
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).map_err(|_| self.syntax("octal escape out of range"))?
            }
            b'x' => {
                let mut value: u8 = 0;
                let mut digits = 0;
                while digits < 2 {
                    match self.peek()?.and_then(|b| (b as char).to_digit(16)) {
                        Some(d) => {
                            self.bump()?;
                            value = value * 16 + d as u8;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(self.syntax("empty hexadecimal escape"));
                }
                value
            }
            other => other,
        };
        Ok(Some(resolved))
    }

    fn read_atom(&mut self) -> Result<Value> {
        let mut token = Vec::new();
        while let Some(b) = self.peek()? {
            if is_delimiter(b) {
                break;
            }
            token.push(b);
            self.bump()?;
        }
        let token = decode_utf8_lossy(&token);
        if is_integer_token(&token) {
            let n = token
                .parse::<i64>()
                .map_err(|_| self.syntax(&format!("integer out of range: {}", token)))?;
            Ok(Value::Integer(n))
        } else {
            Ok(Value::Symbol(token))
        }
    }

    fn skip_blank(&mut self) -> Result<()> {
        while let Some(b) = self.peek()? {
            if b.is_ascii_whitespace() {
                self.bump()?;
            } else if b == b';' {
                while let Some(b) = self.bump()? {
                    if b == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn bump(&mut self) -> Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.inner.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn eof(&self) -> Error {
        Error::UnexpectedEof {
            offset: self.offset,
        }
    }

    fn syntax(&self, message: &str) -> Error {
        Error::Syntax {
            offset: self.offset,
            message: message.to_string(),
        }
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'"' | b';')
}

fn is_integer_token(token: &str) -> bool {
    let digits = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse exactly one expression from a string.
pub fn parse_str(input: &str) -> Result<Value> {
    let mut reader = Reader::new(input.as_bytes());
    let value = reader.read()?.ok_or(Error::UnexpectedEof { offset: 0 })?;
    reader.skip_blank()?;
    if reader.peek()?.is_some() {
        return Err(reader.syntax("trailing data after expression"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_atoms() {
        assert_eq!(parse_str("word").unwrap(), Value::Symbol("word".into()));
        assert_eq!(parse_str("-42").unwrap(), Value::Integer(-42));
        assert_eq!(parse_str("+7").unwrap(), Value::Integer(7));
        assert_eq!(parse_str("-").unwrap(), Value::Symbol("-".into()));
        assert_eq!(
            parse_str("width=2550").unwrap(),
            Value::Symbol("width=2550".into())
        );
    }

    #[test]
    fn test_read_nested_list() {
        let value = parse_str("(line 0 0 10 20 (word 0 0 5 20 \"Hi\"))").unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].as_symbol(), Some("line"));
        assert_eq!(items[4].as_integer(), Some(20));
        let word = items[5].as_list().unwrap();
        assert_eq!(word[5].as_str(), Some("Hi"));
    }

    #[test]
    fn test_string_escapes() {
        let value = parse_str(r#""a\"b\\c\n\101\x42""#).unwrap();
        assert_eq!(value.as_str(), Some("a\"b\\c\nAB"));
    }

    #[test]
    fn test_octal_utf8_string() {
        // djvused escapes non-ASCII bytes as octal
        let value = parse_str(r#""\305\274""#).unwrap();
        assert_eq!(value.as_str(), Some("ż"));
    }

    #[test]
    fn test_control_characters_survive_without_sanitize() {
        let value = parse_str(r#""a\001b""#).unwrap();
        assert_eq!(value.as_str(), Some("a\u{1}b"));
    }

    #[test]
    fn test_sanitize_text() {
        let mut reader = Reader::new(&b"\"a\\001b\""[..]).with_sanitize_text(true);
        let value = reader.read().unwrap().unwrap();
        assert_eq!(value.as_str(), Some("a\u{FFFD}b"));
    }

    #[test]
    fn test_stream_positioning() {
        let mut reader = Reader::new(&b"width=10 height=20\n(page 0 0 10 20 \"x\") "[..]);
        assert_eq!(
            reader.read().unwrap(),
            Some(Value::Symbol("width=10".into()))
        );
        assert_eq!(
            reader.read().unwrap(),
            Some(Value::Symbol("height=20".into()))
        );
        assert!(reader.read().unwrap().unwrap().is_list());
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_clean_eof_is_not_error() {
        let mut reader = Reader::new(&b"   ; trailing comment\n"[..]);
        assert_eq!(reader.read().unwrap(), None);
    }

    #[test]
    fn test_truncated_list() {
        let mut reader = Reader::new(&b"(page 0 0 (line"[..]);
        assert!(matches!(
            reader.read(),
            Err(Error::UnexpectedEof { offset: 15 })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_str("(word 0 0 1 1 \"abc"),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_unbalanced_close() {
        assert!(matches!(parse_str(")"), Err(Error::Syntax { .. })));
        assert!(matches!(parse_str("(a))"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_integer_overflow() {
        assert!(matches!(
            parse_str("99999999999999999999"),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let source = "(word 1 2 3 4 \"a \\\"q\\\"\")";
        let value = parse_str(source).unwrap();
        assert_eq!(value.to_string(), source);
    }
}
