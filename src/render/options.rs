//! Rendering options and configuration.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Default document title.
pub const DEFAULT_TITLE: &str = "DjVu hidden text layer";

/// Default word-segmentation language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Options for rendering the hOCR document.
///
/// Built once per run and shared read-only by every page.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Word segmentation strategy
    pub segmentation: WordSegmentation,

    /// Language tag for locale-aware segmentation
    pub language: String,

    /// Document title
    pub title: String,

    /// Inline CSS; the `<style>` element is omitted when empty
    pub css: String,

    /// Page selection
    pub page_selection: PageSelection,

    /// Value of the `ocr-system` meta tag
    pub ocr_system: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the word segmentation strategy.
    pub fn with_segmentation(mut self, segmentation: WordSegmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Set the segmentation language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the inline CSS.
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = css.into();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific pages.
    pub fn with_page_list(mut self, pages: Vec<u32>) -> Self {
        self.page_selection = PageSelection::Pages(pages);
        self
    }

    /// Set the `ocr-system` meta value.
    pub fn with_ocr_system(mut self, system: impl Into<String>) -> Self {
        self.ocr_system = system.into();
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if !language_pattern().is_match(&self.language) {
            return Err(Error::InvalidOption(format!(
                "language tag {:?}",
                self.language
            )));
        }
        if self.ocr_system.trim().is_empty() {
            return Err(Error::InvalidOption("empty ocr-system".to_string()));
        }
        Ok(())
    }

    /// Builder-style validation.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            segmentation: WordSegmentation::Simple,
            language: DEFAULT_LANGUAGE.to_string(),
            title: DEFAULT_TITLE.to_string(),
            css: String::new(),
            page_selection: PageSelection::All,
            ocr_system: format!("djvu2hocr {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{2,8}([-_][A-Za-z0-9]{1,8})*$").unwrap())
}

/// Word segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WordSegmentation {
    /// Keep the words of the text layer; split only at whitespace when
    /// words have to be rebuilt from characters
    #[default]
    Simple,
    /// Recompute word boundaries with Unicode word-break rules (UAX #29),
    /// using dictionaries for scripts written without spaces
    Uax29,
}

impl WordSegmentation {
    /// Check if this is the locale-aware strategy.
    pub fn is_locale_aware(&self) -> bool {
        matches!(self, WordSegmentation::Uax29)
    }
}

impl FromStr for WordSegmentation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(WordSegmentation::Simple),
            "uax29" => Ok(WordSegmentation::Uax29),
            _ => Err(Error::InvalidOption(format!("word segmentation {:?}", s))),
        }
    }
}

impl fmt::Display for WordSegmentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordSegmentation::Simple => f.write_str("simple"),
            WordSegmentation::Uax29 => f.write_str("uax29"),
        }
    }
}

/// Largest number of pages a selection may list. A bundled DjVu document
/// directory holds at most 65535 components.
pub const MAX_SELECTED_PAGES: usize = 65_535;

/// Page selection for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// Convert all pages
    #[default]
    All,
    /// Convert these pages (1-indexed), in this order
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Explicitly selected pages, if any.
    pub fn pages(&self) -> Option<&[u32]> {
        match self {
            PageSelection::All => None,
            PageSelection::Pages(pages) => Some(pages),
        }
    }

    /// Concrete page list for a document of `page_count` pages.
    pub fn resolve(&self, page_count: u32) -> Vec<u32> {
        match self {
            PageSelection::All => (1..=page_count).collect(),
            PageSelection::Pages(pages) => pages.clone(),
        }
    }

    /// Parse a page selection string (e.g., "17", "37-42", "1,3,5-7").
    ///
    /// Pages keep the order they are given in. A reversed range such as
    /// "42-37" selects nothing. Selections of more than
    /// [`MAX_SELECTED_PAGES`] pages are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start = parse_page_number(start, part)?;
                let end = parse_page_number(end, part)?;
                if end >= start {
                    let count = (end - start) as usize + 1;
                    check_selection_size(pages.len() + count, s)?;
                    pages.extend(start..=end);
                }
            } else {
                check_selection_size(pages.len() + 1, s)?;
                pages.push(parse_page_number(part, part)?);
            }
        }

        Ok(PageSelection::Pages(pages))
    }
}

impl FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PageSelection::parse(s)
    }
}

fn check_selection_size(count: usize, context: &str) -> Result<()> {
    if count > MAX_SELECTED_PAGES {
        return Err(Error::InvalidPageRange(format!(
            "{} selects more than {} pages",
            context, MAX_SELECTED_PAGES
        )));
    }
    Ok(())
}

fn parse_page_number(s: &str, context: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(Error::InvalidPageRange(context.to_string())),
        Ok(n) => Ok(n),
    }
}
