//! # djvu2hocr
//!
//! Conversion of DjVu hidden text layers to hOCR.
//!
//! A DjVu text layer is a tree of zones (page, column, region, paragraph,
//! line, word, character) with a bounding box each, dumped by `djvused` as
//! s-expressions. This library turns such a tree into hOCR markup, rebuilding
//! words and their boxes where the layer's granularity does not match what
//! hOCR expects.
//!
//! ## Quick Start
//!
//! ```no_run
//! use djvu2hocr::dump_to_hocr;
//!
//! fn main() -> djvu2hocr::Result<()> {
//!     let dump = "width=100 height=20\n\
//!                 (page 0 0 100 20 (line 0 0 100 20 (word 0 0 50 20 \"Hi\")))\n";
//!     let html = dump_to_hocr(dump)?;
//!     println!("{}", html);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Streaming**: one page is parsed, converted and flushed at a time
//! - **Word re-segmentation**: character-level layers and text runs are
//!   split into words with synthesized boxes (UAX #29 or whitespace)
//! - **djvused integration**: documents are dumped through a subprocess
//! - **Batch conversion**: several documents in parallel with Rayon
//! - **JSON output**: page element trees as JSON

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;

// Re-export commonly used types
pub use convert::{ConvertOptions, InputKind};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_djvu, DjvuFormat};
pub use error::{Error, Result};
pub use model::{BBox, Element, Zone, ZoneContent, ZoneType};
pub use parser::{ErrorMode, PageSize, PageStream, ParseOptions};
pub use render::{
    ConvertStats, JsonFormat, OutputFormat, PageSelection, RenderOptions, RenderResult,
    WordSegmentation,
};

use render::{collect_content, xml, PageRenderer, TreeBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Parse a single zone tree.
///
/// `page_height` flips the bottom-left-origin coordinates of the input.
///
/// # Example
///
/// ```
/// use djvu2hocr::{parse_zone, ZoneType};
///
/// let zone = parse_zone("(word 0 0 10 5 \"hi\")", 20).unwrap();
/// assert_eq!(zone.zone_type(), ZoneType::Word);
/// assert_eq!(zone.bbox().y0, 15);
/// ```
pub fn parse_zone(source: &str, page_height: i64) -> Result<Zone> {
    Zone::from_value(parser::parse_str(source)?, page_height)
}

/// Convert one page's zone tree to an hOCR page fragment.
///
/// # Example
///
/// ```
/// use djvu2hocr::{page_to_hocr, PageSize, RenderOptions};
///
/// let html = page_to_hocr(
///     "(page 0 0 10 10 (word 0 0 10 10 \"x\"))",
///     PageSize::new(10, 10),
///     &RenderOptions::default(),
/// )
/// .unwrap();
/// assert!(html.starts_with("<div class=\"ocr_page\""));
/// ```
pub fn page_to_hocr(source: &str, size: PageSize, options: &RenderOptions) -> Result<String> {
    options.validate()?;
    let zone = parse_zone(source, size.height)?;
    let page = TreeBuilder::new(options, size.bbox()).build_page(Some(&zone))?;
    Ok(xml::to_xml(&page))
}

/// Convert a page dump to a complete hOCR document.
pub fn dump_to_hocr(dump: &str) -> Result<String> {
    dump_to_hocr_with_options(dump, &RenderOptions::default())
}

/// Convert a page dump to a complete hOCR document with custom options.
///
/// # Example
///
/// ```no_run
/// use djvu2hocr::{dump_to_hocr_with_options, RenderOptions, WordSegmentation};
///
/// let dump = std::fs::read_to_string("book.dump").unwrap();
/// let options = RenderOptions::new()
///     .with_segmentation(WordSegmentation::Uax29)
///     .with_title("Scanned book");
/// let html = dump_to_hocr_with_options(&dump, &options).unwrap();
/// ```
pub fn dump_to_hocr_with_options(dump: &str, options: &RenderOptions) -> Result<String> {
    options.validate()?;
    let stream = PageStream::new(dump.as_bytes());
    collect_content(PageRenderer::new(stream, options.clone()))
}

/// Convert a DjVu document to hOCR through `djvused`.
///
/// # Example
///
/// ```no_run
/// use djvu2hocr::to_hocr;
///
/// let html = to_hocr("book.djvu").unwrap();
/// std::fs::write("book.html", html).unwrap();
/// ```
pub fn to_hocr<P: AsRef<Path>>(path: P) -> Result<String> {
    Djvu2Hocr::new().convert_document(path).map(|r| r.content)
}

/// Builder for configuring and running conversions.
///
/// # Example
///
/// ```no_run
/// use djvu2hocr::{Djvu2Hocr, PageSelection, WordSegmentation};
///
/// let result = Djvu2Hocr::new()
///     .with_pages(PageSelection::parse("1-3")?)
///     .with_segmentation(WordSegmentation::Uax29)
///     .with_language("pol")
///     .strict()
///     .convert_document("book.djvu")?;
/// println!("{} words", result.stats.word_count);
/// # Ok::<(), djvu2hocr::Error>(())
/// ```
pub struct Djvu2Hocr {
    options: ConvertOptions,
}

impl Djvu2Hocr {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
        }
    }

    /// Treat a page stream that ends early as success.
    pub fn lenient(mut self) -> Self {
        self.options.parse = self.options.parse.lenient();
        self
    }

    /// Fail with [`Error::Truncated`] when the page stream ends early.
    pub fn strict(mut self) -> Self {
        self.options.parse = self.options.parse.strict();
        self
    }

    /// Replace invalid UTF-8 and control characters in input strings.
    pub fn sanitize_text(mut self) -> Self {
        self.options.parse = self.options.parse.with_sanitize_text(true);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options.render = self.options.render.with_pages(pages);
        self
    }

    /// Set the word segmentation strategy.
    pub fn with_segmentation(mut self, segmentation: WordSegmentation) -> Self {
        self.options.render = self.options.render.with_segmentation(segmentation);
        self
    }

    /// Set the segmentation language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.options.render = self.options.render.with_language(language);
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options.render = self.options.render.with_title(title);
        self
    }

    /// Set the inline CSS.
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.options.render = self.options.render.with_css(css);
        self
    }

    /// Emit JSON instead of hOCR.
    pub fn json(mut self, format: JsonFormat) -> Self {
        self.options = self
            .options
            .with_format(OutputFormat::Json)
            .with_json_format(format);
        self
    }

    /// Set the `djvused` executable.
    pub fn with_djvused(mut self, program: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_djvused(program);
        self
    }

    /// Options the builder has accumulated.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a page dump held in memory.
    pub fn convert_dump(&self, dump: &str) -> Result<RenderResult> {
        let mut out = Vec::new();
        let stats = convert::convert_stream(dump.as_bytes(), &mut out, &self.options)?;
        Ok(RenderResult::new(into_string(out)?, stats))
    }

    /// Convert a DjVu document into memory.
    pub fn convert_document<P: AsRef<Path>>(&self, path: P) -> Result<RenderResult> {
        let mut out = Vec::new();
        let stats = convert::convert_document(path, &mut out, &self.options)?;
        Ok(RenderResult::new(into_string(out)?, stats))
    }

    /// Convert a DjVu document, streaming the output to `writer`.
    pub fn write_document<P: AsRef<Path>, W: Write>(
        &self,
        path: P,
        writer: &mut W,
    ) -> Result<ConvertStats> {
        convert::convert_document(path, writer, &self.options)
    }
}

impl Default for Djvu2Hocr {
    fn default() -> Self {
        Self::new()
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| Error::Render(format!("output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "width=100 height=20\n\
        (page 0 0 100 20 (line 0 0 100 20 (word 0 0 50 20 \"Hi\") (word 50 0 100 20 \"Bye\")))\n";

    #[test]
    fn test_builder() {
        let builder = Djvu2Hocr::new()
            .strict()
            .sanitize_text()
            .with_title("Scan")
            .json(JsonFormat::Compact);

        assert_eq!(builder.options().parse.error_mode, ErrorMode::Strict);
        assert!(builder.options().parse.sanitize_text);
        assert_eq!(builder.options().render.title, "Scan");
        assert_eq!(builder.options().output_format, OutputFormat::Json);
    }

    #[test]
    fn test_builder_default() {
        let builder = Djvu2Hocr::default();
        assert_eq!(builder.options().parse.error_mode, ErrorMode::Lenient);
        assert_eq!(builder.options().output_format, OutputFormat::Hocr);
        assert_eq!(builder.options().render.page_selection, PageSelection::All);
    }

    #[test]
    fn test_convert_dump() {
        let result = Djvu2Hocr::new().convert_dump(DUMP).unwrap();
        assert_eq!(result.stats.pages_converted, 1);
        assert_eq!(result.stats.word_count, 2);
        assert!(result.content.contains(">Hi</span> <span"));
    }

    #[test]
    fn test_dump_to_hocr() {
        let html = dump_to_hocr(DUMP).unwrap();
        assert!(html.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(html.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn test_page_to_hocr() {
        let html = page_to_hocr(
            "(page 0 0 10 10 (word 0 0 10 10 \"x\"))",
            PageSize::new(10, 10),
            &RenderOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            "<div class=\"ocr_page\" title=\"bbox 0 0 10 10\">\
             <span class=\"ocrx_word\" title=\"bbox 0 0 10 10\">x</span></div>"
        );
    }

    #[test]
    fn test_parse_zone_errors() {
        assert!(matches!(
            parse_zone("(word 0 0 1 1 \"x\"", 1),
            Err(Error::UnexpectedEof { .. })
        ));
        assert!(matches!(
            parse_zone("(glyph 0 0 1 1 \"x\")", 1),
            Err(Error::UnknownZoneType(_))
        ));
    }

    #[test]
    fn test_detect_format_empty_data() {
        assert!(matches!(
            detect_format_from_bytes(&[]),
            Err(Error::UnknownFormat)
        ));
    }
}
