//! Per-page reader for `djvused` dumps.
//!
//! For every selected page, `select N; size; print-txt` makes `djvused`
//! print a size record of `key=value` tokens followed by the page's zone
//! tree as one s-expression:
//!
//! ```text
//! width=2550 height=3300
//! (page 0 0 2550 3300
//!  (line 100 3000 900 3050 (word 100 3000 400 3050 "Hello") ...))
//! ```
//!
//! Pages without a text layer print the size record only.

use super::sexpr::{Reader, Value};
use super::ParseOptions;
use crate::error::{Error, Result};
use crate::model::{BBox, Zone};
use log::debug;
use regex::Regex;
use std::io::BufRead;

/// Page dimensions from the size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    /// Page width in pixels
    pub width: i64,
    /// Page height in pixels
    pub height: i64,
    /// Rotation code, when the page is rotated
    pub rotation: Option<i64>,
}

impl PageSize {
    /// Create a page size without rotation.
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            rotation: None,
        }
    }

    /// Full-page bounding box.
    pub fn bbox(&self) -> BBox {
        BBox::new(0, 0, self.width, self.height)
    }
}

/// One page read from the dump.
#[derive(Debug, Clone)]
pub struct PageDump {
    /// Physical page size
    pub size: PageSize,
    /// Zone tree, absent when the page has no text layer
    pub zone: Option<Zone>,
}

/// Source of pages for the converter.
pub trait PageSource {
    /// Read the next page; `Ok(None)` when the input is exhausted.
    fn next_page(&mut self) -> Result<Option<PageDump>>;
}

impl<S: PageSource + ?Sized> PageSource for &mut S {
    fn next_page(&mut self) -> Result<Option<PageDump>> {
        (**self).next_page()
    }
}

impl<S: PageSource + ?Sized> PageSource for Box<S> {
    fn next_page(&mut self) -> Result<Option<PageDump>> {
        (**self).next_page()
    }
}

/// Reads [`PageDump`]s one at a time from a `djvused` output stream.
pub struct PageStream<R> {
    reader: Reader<R>,
    pending: Option<Value>,
    size_token: Regex,
}

impl<R: BufRead> PageStream<R> {
    /// Create a page stream with default options.
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, &ParseOptions::default())
    }

    /// Create a page stream with custom options.
    pub fn with_options(inner: R, options: &ParseOptions) -> Self {
        Self {
            reader: Reader::new(inner).with_sanitize_text(options.sanitize_text),
            pending: None,
            size_token: Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)=([+-]?[0-9]+)$").unwrap(),
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.reader.offset()
    }

    /// Consume the stream and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    fn next_value(&mut self) -> Result<Option<Value>> {
        match self.pending.take() {
            Some(value) => Ok(Some(value)),
            None => self.reader.read(),
        }
    }

    fn parse_size_token<'a>(&self, token: &'a str) -> Option<(&'a str, i64)> {
        let caps = self.size_token.captures(token)?;
        let key = caps.get(1)?.as_str();
        let value = caps.get(2)?.as_str().parse().ok()?;
        Some((key, value))
    }

    fn syntax(&self, message: String) -> Error {
        Error::Syntax {
            offset: self.reader.offset(),
            message,
        }
    }
}

impl<R: BufRead> PageSource for PageStream<R> {
    fn next_page(&mut self) -> Result<Option<PageDump>> {
        let mut width = None;
        let mut height = None;
        let mut rotation = None;
        let mut seen_any = false;

        let tree = loop {
            let value = match self.next_value()? {
                Some(value) => value,
                None if !seen_any => return Ok(None),
                None => break None,
            };
            match value {
                Value::List(_) => break Some(value),
                Value::Symbol(ref token) => {
                    let (key, n) = self
                        .parse_size_token(token)
                        .ok_or_else(|| self.syntax(format!("unexpected token {}", token)))?;
                    let slot = match key {
                        "width" => &mut width,
                        "height" => &mut height,
                        "rotation" => &mut rotation,
                        _ => {
                            debug!("ignoring size attribute {}", token);
                            seen_any = true;
                            continue;
                        }
                    };
                    if slot.is_some() {
                        // The next page's size record: this page has no text.
                        self.pending = Some(value);
                        break None;
                    }
                    *slot = Some(n);
                    seen_any = true;
                }
                other => {
                    return Err(self.syntax(format!(
                        "unexpected {} in size record",
                        other.kind()
                    )))
                }
            }
        };

        let (width, height) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(self.syntax("size record lacks width or height".to_string())),
        };
        let size = PageSize {
            width,
            height,
            rotation,
        };
        let zone = tree.map(|t| Zone::from_value(t, height)).transpose()?;
        Ok(Some(PageDump { size, zone }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ZoneType;

    #[test]
    fn test_read_pages() {
        let dump = b"width=100 height=20\n(page 0 0 100 20 (word 0 0 50 20 \"Hi\"))\n\
                     width=50 height=40 rotation=1\n(page 0 0 50 40 \"x\")\n";
        let mut stream = PageStream::new(&dump[..]);

        let first = stream.next_page().unwrap().unwrap();
        assert_eq!(first.size, PageSize::new(100, 20));
        assert_eq!(first.zone.unwrap().zone_type(), ZoneType::Page);

        let second = stream.next_page().unwrap().unwrap();
        assert_eq!(second.size.rotation, Some(1));
        assert_eq!(second.size.bbox(), BBox::new(0, 0, 50, 40));

        assert!(stream.next_page().unwrap().is_none());
    }

    #[test]
    fn test_page_without_text() {
        let dump = b"width=10 height=10\nwidth=20 height=20\n(page 0 0 20 20 \"y\")";
        let mut stream = PageStream::new(&dump[..]);

        let empty = stream.next_page().unwrap().unwrap();
        assert_eq!(empty.size.width, 10);
        assert!(empty.zone.is_none());

        let full = stream.next_page().unwrap().unwrap();
        assert_eq!(full.size.width, 20);
        assert!(full.zone.is_some());
    }

    #[test]
    fn test_last_page_without_text() {
        let mut stream = PageStream::new(&b"width=10 height=10\n"[..]);
        let page = stream.next_page().unwrap().unwrap();
        assert!(page.zone.is_none());
        assert!(stream.next_page().unwrap().is_none());
    }

    #[test]
    fn test_truncated_tree() {
        let mut stream = PageStream::new(&b"width=10 height=10\n(page 0 0 10"[..]);
        let err = stream.next_page().unwrap_err();
        assert!(err.is_stream_end());
    }

    #[test]
    fn test_garbage_token() {
        let mut stream = PageStream::new(&b"hello\n"[..]);
        assert!(matches!(stream.next_page(), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_malformed_zone_is_not_stream_end() {
        let mut stream = PageStream::new(&b"width=10 height=10\n(page 0 0 10 10)"[..]);
        let err = stream.next_page().unwrap_err();
        assert!(matches!(err, Error::ZoneShape(_)));
        assert!(!err.is_stream_end());
    }

    #[test]
    fn test_coordinates_are_flipped() {
        let dump = b"width=100 height=50\n(page 0 0 100 50 (line 10 5 90 15 \"t\"))";
        let mut stream = PageStream::new(&dump[..]);
        let page = stream.next_page().unwrap().unwrap();
        let zone = page.zone.unwrap();
        assert_eq!(zone.children()[0].bbox(), BBox::new(10, 35, 90, 45));
    }
}
