//! End-to-end conversion drivers.
//!
//! A driver pulls pages from a source, writes the header, flushes every
//! page fragment as soon as it is built and finishes with the footer.
//! Sources are either a pre-produced page dump or a `djvused` process
//! reading a DjVu document.
//!
//! # Example
//!
//! ```no_run
//! use djvu2hocr::convert::{convert_file, ConvertOptions};
//!
//! fn main() -> djvu2hocr::Result<()> {
//!     let mut out = std::io::stdout().lock();
//!     let stats = convert_file("book.djvu", &mut out, &ConvertOptions::default())?;
//!     eprintln!("{} pages, {} words", stats.pages_converted, stats.word_count);
//!     Ok(())
//! }
//! ```

mod batch;
pub mod djvused;

pub use batch::{convert_files, output_path, BatchItem};
pub use djvused::{Djvused, DjvusedPages};

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::parser::{ErrorMode, PageSource, PageStream, ParseOptions};
use crate::render::{
    ConvertStats, JsonFormat, OutputFormat, PageRenderer, PageSelection, RenderEvent,
    RenderOptions,
};
use log::warn;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Kind of input a path names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputKind {
    /// A DjVu document, dumped through `djvused`
    #[default]
    Document,
    /// A pre-produced page dump; `-` reads standard input
    Dump,
}

/// Options for document conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Rendering options
    pub render: RenderOptions,

    /// Input parsing options
    pub parse: ParseOptions,

    /// Output format
    pub output_format: OutputFormat,

    /// JSON layout, for JSON output
    pub json_format: JsonFormat,

    /// What input paths name
    pub input: InputKind,

    /// `djvused` executable
    pub djvused: PathBuf,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set the input kind.
    pub fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    /// Set the `djvused` executable.
    pub fn with_djvused(mut self, program: impl Into<PathBuf>) -> Self {
        self.djvused = program.into();
        self
    }

    fn renderer<S: PageSource>(&self, source: S) -> PageRenderer<S> {
        PageRenderer::new(source, self.render.clone())
            .with_format(self.output_format, self.json_format)
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            parse: ParseOptions::default(),
            output_format: OutputFormat::default(),
            json_format: JsonFormat::default(),
            input: InputKind::default(),
            djvused: PathBuf::from(djvused::DEFAULT_PROGRAM),
        }
    }
}

/// Convert a page dump read from `input`.
pub fn convert_stream<R: BufRead, W: Write>(
    input: R,
    writer: &mut W,
    options: &ConvertOptions,
) -> Result<ConvertStats> {
    options.render.validate()?;
    let stream = PageStream::with_options(input, &options.parse);
    let stats = write_events(options.renderer(stream), writer)?;
    check_complete(stats, options.parse.error_mode)
}

/// Convert a DjVu document through `djvused`.
pub fn convert_document<P: AsRef<Path>, W: Write>(
    path: P,
    writer: &mut W,
    options: &ConvertOptions,
) -> Result<ConvertStats> {
    let path = path.as_ref();
    options.render.validate()?;
    detect_format_from_path(path)?;

    let djvused = Djvused::new(&options.djvused);
    let pages = match options.render.page_selection {
        PageSelection::All => {
            let count = djvused.page_count(path)?;
            PageSelection::All.resolve(count)
        }
        PageSelection::Pages(ref pages) => pages.clone(),
    };

    let mut source = djvused.spawn(path, &pages, &options.parse)?;
    let renderer = options.renderer(&mut source).with_page_numbers(pages);
    let stats = write_events(renderer, writer)?;
    source.finish()?;
    check_complete(stats, options.parse.error_mode)
}

/// Convert a file according to `options.input`.
///
/// With [`InputKind::Dump`], the path `-` reads standard input.
pub fn convert_file<P: AsRef<Path>, W: Write>(
    path: P,
    writer: &mut W,
    options: &ConvertOptions,
) -> Result<ConvertStats> {
    let path = path.as_ref();
    match options.input {
        InputKind::Document => convert_document(path, writer, options),
        InputKind::Dump if path == Path::new("-") => {
            convert_stream(io::stdin().lock(), writer, options)
        }
        InputKind::Dump => {
            let file = File::open(path)?;
            convert_stream(BufReader::new(file), writer, options)
        }
    }
}

/// Write every event of `renderer`, flushing after each page.
fn write_events<S: PageSource, W: Write>(
    mut renderer: PageRenderer<S>,
    writer: &mut W,
) -> Result<ConvertStats> {
    for event in renderer.by_ref() {
        let event = event?;
        if let Some(content) = event.content() {
            writer.write_all(content.as_bytes())?;
        }
        if matches!(event, RenderEvent::Page { .. }) {
            writer.flush()?;
        }
    }
    writer.flush()?;
    Ok(renderer.into_stats())
}

fn check_complete(stats: ConvertStats, mode: ErrorMode) -> Result<ConvertStats> {
    if stats.is_complete() {
        return Ok(stats);
    }
    let requested = stats.pages_requested.unwrap_or(stats.pages_converted + 1);
    match mode {
        ErrorMode::Lenient => {
            warn!(
                "converted {} of {} pages",
                stats.pages_converted, requested
            );
            Ok(stats)
        }
        ErrorMode::Strict => Err(Error::Truncated {
            converted: stats.pages_converted,
            requested,
        }),
    }
}
