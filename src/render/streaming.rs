//! Streaming renderer that converts one page at a time.
//!
//! The renderer pulls pages from a [`PageSource`] only when the next event
//! is requested, so the header can be written before the first page is
//! read and every page can be flushed before the next one is parsed.
//!
//! # Example
//!
//! ```no_run
//! use djvu2hocr::parser::PageStream;
//! use djvu2hocr::render::{PageRenderer, RenderEvent, RenderOptions};
//! use std::io::{BufReader, Write};
//!
//! fn main() -> djvu2hocr::Result<()> {
//!     let input = BufReader::new(std::fs::File::open("book.dump")?);
//!     let renderer = PageRenderer::new(PageStream::new(input), RenderOptions::default());
//!     let mut out = std::io::stdout().lock();
//!
//!     for event in renderer {
//!         match event? {
//!             RenderEvent::Page { number, content } => {
//!                 eprintln!("page {}", number);
//!                 out.write_all(content.as_bytes())?;
//!                 out.flush()?;
//!             }
//!             other => out.write_all(other.content().unwrap_or("").as_bytes())?,
//!         }
//!     }
//!     Ok(())
//! }
//! ```

use super::builder::TreeBuilder;
use super::hocr::{self, FOOTER};
use super::json::{to_json, JsonFormat};
use super::result::ConvertStats;
use super::segment::WordBreaker;
use super::xml::to_xml;
use super::RenderOptions;
use crate::error::Result;
use crate::parser::PageSource;
use log::{info, warn};
use std::fmt;
use std::str::FromStr;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One XHTML document with a fragment per page
    #[default]
    Hocr,
    /// One JSON document per page, newline separated
    Json,
}

impl FromStr for OutputFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hocr" | "html" => Ok(OutputFormat::Hocr),
            "json" => Ok(OutputFormat::Json),
            _ => Err(crate::error::Error::InvalidOption(format!(
                "output format {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Hocr => f.write_str("hocr"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

/// Events emitted during streaming rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Document rendering has started.
    DocumentStart {
        /// Everything before the first page
        header: String,
    },

    /// A page has been converted.
    Page {
        /// 1-indexed page number
        number: u32,
        /// Serialized page fragment
        content: String,
    },

    /// Document rendering has completed.
    DocumentEnd {
        /// Everything after the last page
        footer: String,
    },
}

impl RenderEvent {
    /// Get the text this event contributes to the output.
    pub fn content(&self) -> Option<&str> {
        match self {
            RenderEvent::DocumentStart { header } => Some(header),
            RenderEvent::Page { content, .. } => Some(content),
            RenderEvent::DocumentEnd { footer } => Some(footer),
        }
    }

    /// Check if this is a document boundary event.
    pub fn is_document_boundary(&self) -> bool {
        matches!(
            self,
            RenderEvent::DocumentStart { .. } | RenderEvent::DocumentEnd { .. }
        )
    }

    /// Page number, for page events.
    pub fn page_number(&self) -> Option<u32> {
        match self {
            RenderEvent::Page { number, .. } => Some(*number),
            _ => None,
        }
    }
}

/// Internal state for the streaming renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Before any output
    Initial,
    /// Reading pages
    InPages,
    /// All pages read, waiting to emit document end
    PagesComplete,
    /// Rendering complete
    Done,
}

/// Streaming renderer that yields rendering events as an iterator.
///
/// A page stream that ends early, with a syntax error or in the middle of
/// an expression, ends the page loop: the footer is still emitted and
/// [`ConvertStats::truncated`] is set. Malformed zone trees and I/O errors
/// are yielded as errors and end the iteration.
pub struct PageRenderer<S> {
    source: S,
    options: RenderOptions,
    breaker: WordBreaker,
    format: OutputFormat,
    json_format: JsonFormat,
    page_numbers: Option<Vec<u32>>,
    next_index: usize,
    state: StreamState,
    stats: ConvertStats,
}

impl<S: PageSource> PageRenderer<S> {
    /// Create a new streaming renderer.
    ///
    /// Pages are numbered from the options' page selection when it lists
    /// pages, and from 1 otherwise.
    pub fn new(source: S, options: RenderOptions) -> Self {
        let page_numbers = options.page_selection.pages().map(|p| p.to_vec());
        let mut renderer = Self {
            source,
            breaker: WordBreaker::from_options(&options),
            options,
            format: OutputFormat::Hocr,
            json_format: JsonFormat::default(),
            page_numbers: None,
            next_index: 0,
            state: StreamState::Initial,
            stats: ConvertStats::new(),
        };
        if let Some(numbers) = page_numbers {
            renderer = renderer.with_page_numbers(numbers);
        }
        renderer
    }

    /// Set the output format.
    pub fn with_format(mut self, format: OutputFormat, json_format: JsonFormat) -> Self {
        self.format = format;
        self.json_format = json_format;
        self
    }

    /// Set the numbers of the pages the source will produce, in order.
    ///
    /// At most that many pages are read; fewer marks the run as truncated.
    pub fn with_page_numbers(mut self, numbers: Vec<u32>) -> Self {
        self.stats.pages_requested = Some(numbers.len() as u32);
        self.page_numbers = Some(numbers);
        self
    }

    /// Statistics gathered so far.
    pub fn stats(&self) -> &ConvertStats {
        &self.stats
    }

    /// Check if rendering is complete.
    pub fn is_done(&self) -> bool {
        self.state == StreamState::Done
    }

    /// Consume the renderer, returning its statistics.
    pub fn into_stats(self) -> ConvertStats {
        self.stats
    }

    fn header(&self) -> String {
        match self.format {
            OutputFormat::Hocr => hocr::header(&self.options),
            OutputFormat::Json => String::new(),
        }
    }

    fn footer(&self) -> String {
        match self.format {
            OutputFormat::Hocr => FOOTER.to_string(),
            OutputFormat::Json => String::new(),
        }
    }

    fn current_page_number(&self) -> Option<u32> {
        match self.page_numbers {
            Some(ref numbers) => numbers.get(self.next_index).copied(),
            None => Some(self.next_index as u32 + 1),
        }
    }

    /// Read and convert the next page; `Ok(None)` when the page loop ends.
    fn next_page(&mut self) -> Result<Option<RenderEvent>> {
        let number = match self.current_page_number() {
            Some(number) => number,
            None => return Ok(None),
        };

        let dump = match self.source.next_page() {
            Ok(Some(dump)) => dump,
            Ok(None) => {
                if self.page_numbers.is_some() {
                    warn!("page stream ended before page {}", number);
                    self.stats.mark_truncated();
                }
                return Ok(None);
            }
            Err(e) if e.is_stream_end() => {
                warn!("page stream ended early at page {}: {}", number, e);
                self.stats.mark_truncated();
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        info!("- Page #{}", number);
        let builder = TreeBuilder::with_breaker(self.breaker.clone(), dump.size.bbox());
        let page = builder.build_page(dump.zone.as_ref())?;
        let content = match self.format {
            OutputFormat::Hocr => to_xml(&page),
            OutputFormat::Json => {
                let mut json = to_json(&page, self.json_format)?;
                json.push('\n');
                json
            }
        };
        self.stats.add_page(&page);
        self.next_index += 1;
        Ok(Some(RenderEvent::Page { number, content }))
    }
}

impl<S: PageSource> Iterator for PageRenderer<S> {
    type Item = Result<RenderEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            StreamState::Initial => {
                self.state = StreamState::InPages;
                Some(Ok(RenderEvent::DocumentStart {
                    header: self.header(),
                }))
            }

            StreamState::InPages => match self.next_page() {
                Ok(Some(event)) => Some(Ok(event)),
                Ok(None) => {
                    self.state = StreamState::PagesComplete;
                    self.next()
                }
                Err(e) => {
                    self.state = StreamState::Done;
                    Some(Err(e))
                }
            },

            StreamState::PagesComplete => {
                self.state = StreamState::Done;
                Some(Ok(RenderEvent::DocumentEnd {
                    footer: self.footer(),
                }))
            }

            StreamState::Done => None,
        }
    }
}

/// Collect all content from a streaming renderer into a single string.
pub fn collect_content<S: PageSource>(renderer: PageRenderer<S>) -> Result<String> {
    let mut output = String::new();
    for event in renderer {
        if let Some(content) = event?.content() {
            output.push_str(content);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::PageStream;

    const TWO_PAGES: &str = "width=100 height=20\n\
        (page 0 0 100 20 (line 0 0 100 20 (word 0 0 50 20 \"Hi\") (word 50 0 100 20 \"Bye\")))\n\
        width=10 height=10\n(page 0 0 10 10 (word 0 0 10 10 \"x\"))\n";

    fn renderer(dump: &str, options: RenderOptions) -> PageRenderer<PageStream<&[u8]>> {
        PageRenderer::new(PageStream::new(dump.as_bytes()), options)
    }

    #[test]
    fn test_event_order() {
        let events: Vec<_> = renderer(TWO_PAGES, RenderOptions::default())
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RenderEvent::DocumentStart { .. }));
        assert_eq!(events[1].page_number(), Some(1));
        assert_eq!(events[2].page_number(), Some(2));
        assert!(matches!(events[3], RenderEvent::DocumentEnd { .. }));
    }

    #[test]
    fn test_stats() {
        let mut r = renderer(TWO_PAGES, RenderOptions::default());
        for event in r.by_ref() {
            event.unwrap();
        }
        assert!(r.is_done());
        let stats = r.into_stats();
        assert_eq!(stats.pages_converted, 2);
        assert_eq!(stats.word_count, 3);
        assert!(stats.is_complete());
    }

    #[test]
    fn test_page_numbers_follow_selection() {
        let options = RenderOptions::new().with_page_list(vec![7, 3]);
        let numbers: Vec<_> = renderer(TWO_PAGES, options)
            .filter_map(|e| e.unwrap().page_number())
            .collect();
        assert_eq!(numbers, vec![7, 3]);
    }

    #[test]
    fn test_selection_limits_pages_read() {
        let options = RenderOptions::new().with_page_list(vec![1]);
        let mut r = renderer(TWO_PAGES, options);
        let pages = r.by_ref().filter(|e| matches!(e, Ok(RenderEvent::Page { .. }))).count();
        assert_eq!(pages, 1);
        assert!(r.stats().is_complete());
    }

    #[test]
    fn test_missing_pages_mark_truncation() {
        let options = RenderOptions::new().with_page_list(vec![1, 2, 3]);
        let mut r = renderer(TWO_PAGES, options);
        let events: Vec<_> = r.by_ref().collect::<Result<_>>().unwrap();
        assert!(matches!(events.last(), Some(RenderEvent::DocumentEnd { .. })));
        assert!(r.stats().truncated);
        assert_eq!(r.stats().pages_missing(), 1);
    }

    #[test]
    fn test_truncated_stream_ends_gracefully() {
        let dump = "width=10 height=10\n(page 0 0 10 10 (word 0 0 10 10 \"a\"))\n\
                    width=10 height=10\n(page 0 0 10 10 (word 0 0";
        let mut r = renderer(dump, RenderOptions::default());
        let events: Vec<_> = r.by_ref().collect::<Result<_>>().unwrap();

        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], RenderEvent::DocumentEnd { .. }));
        assert!(r.stats().truncated);
        assert_eq!(r.stats().pages_converted, 1);
    }

    #[test]
    fn test_malformed_zone_is_an_error() {
        let dump = "width=10 height=10\n(page 0 0 10 10 (bogus 0 0 1 1 \"a\"))\n";
        let mut r = renderer(dump, RenderOptions::default());
        assert!(matches!(r.next(), Some(Ok(RenderEvent::DocumentStart { .. }))));
        assert!(matches!(r.next(), Some(Err(Error::UnknownZoneType(_)))));
        assert!(r.next().is_none());
    }

    #[test]
    fn test_collect_content() {
        let content = collect_content(renderer(TWO_PAGES, RenderOptions::default())).unwrap();
        assert!(content.starts_with("<?xml"));
        assert!(content.contains("<span class=\"ocrx_word\" title=\"bbox 0 0 50 20\">Hi</span> "));
        assert!(content.contains("</div><div class=\"ocr_page\""));
        assert!(content.ends_with("</div>\n</body>\n</html>\n"));
    }

    #[test]
    fn test_json_pages() {
        let r = renderer(TWO_PAGES, RenderOptions::default())
            .with_format(OutputFormat::Json, JsonFormat::Compact);
        let content = collect_content(r).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"tag\":\"div\",\"class\":\"ocr_page\""));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("hocr".parse::<OutputFormat>().unwrap(), OutputFormat::Hocr);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
