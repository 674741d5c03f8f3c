//! Error types for djvu2hocr library.

use std::io;
use thiserror::Error;

/// Result type alias for djvu2hocr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a text layer.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing streams.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a DjVu container.
    #[error("Unknown file format: not a valid DjVu document")]
    UnknownFormat,

    /// Malformed s-expression in the page dump.
    #[error("Syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset in the stream where the error was detected
        offset: u64,
        /// What went wrong
        message: String,
    },

    /// The stream ended in the middle of an expression.
    #[error("Unexpected end of input at byte {offset}")]
    UnexpectedEof {
        /// Byte offset of the end of the stream
        offset: u64,
    },

    /// A zone carries a type symbol outside the known hierarchy.
    #[error("Unknown text zone type: {0}")]
    UnknownZoneType(String),

    /// A zone list does not have the expected shape.
    #[error("Malformed text zone: {0}")]
    ZoneShape(String),

    /// Malformed page range.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// A run-wide option failed validation.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The page-dump subprocess failed.
    #[error("Subprocess error: {0}")]
    Subprocess(String),

    /// The page stream ended before every requested page was converted.
    #[error("Input ended early: converted {converted} of {requested} pages")]
    Truncated {
        /// Pages written before the stream ended
        converted: u32,
        /// Pages that were requested
        requested: u32,
    },

    /// Error during rendering (hOCR, JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error means the input stream was cut short or garbled.
    ///
    /// At a page boundary these end the page loop instead of failing it.
    pub fn is_stream_end(&self) -> bool {
        matches!(self, Error::Syntax { .. } | Error::UnexpectedEof { .. })
    }
}
