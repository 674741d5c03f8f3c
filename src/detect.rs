//! DjVu format detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Kind of DjVu document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DjvuKind {
    /// Single-page document (`DJVU` form)
    SinglePage,
    /// Multi-page document, bundled or indirect (`DJVM` form)
    MultiPage,
}

/// DjVu format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DjvuFormat {
    /// Document kind
    pub kind: DjvuKind,
    /// Length of the top-level form as declared in its header
    pub form_length: u32,
}

impl std::fmt::Display for DjvuFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            DjvuKind::SinglePage => write!(f, "DjVu (single page)"),
            DjvuKind::MultiPage => write!(f, "DjVu (multi-page)"),
        }
    }
}

/// DjVu magic bytes: the `AT&T` prefix followed by an IFF `FORM` chunk.
const DJVU_MAGIC: &[u8] = b"AT&TFORM";
const HEADER_LEN: usize = 16;

/// Detect DjVu format from a file path.
///
/// # Example
/// ```no_run
/// use djvu2hocr::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("book.djvu").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<DjvuFormat> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    BufReader::new(file)
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect DjVu format from the first 16 bytes of a file.
///
/// Returns `Err(Error::UnknownFormat)` when the data is not a DjVu
/// document. Shared-annotation (`DJVI`) and thumbnail (`THUM`) forms are
/// DjVu files but not documents, and are rejected too.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<DjvuFormat> {
    if data.len() < HEADER_LEN || !data.starts_with(DJVU_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let form_length = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
    let kind = match &data[12..16] {
        b"DJVU" => DjvuKind::SinglePage,
        b"DJVM" => DjvuKind::MultiPage,
        _ => return Err(Error::UnknownFormat),
    };

    Ok(DjvuFormat { kind, form_length })
}

/// Check if a file is a DjVu document.
pub fn is_djvu<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes start a DjVu document.
pub fn is_djvu_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
