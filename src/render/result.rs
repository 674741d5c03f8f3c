//! Conversion result with statistics.

use super::hocr::WORD_CLASS;
use crate::model::Element;
use serde::{Deserialize, Serialize};

/// Result of rendering a whole document into memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered document
    pub content: String,

    /// Conversion statistics
    pub stats: ConvertStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, stats: ConvertStats) -> Self {
        Self { content, stats }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Statistics collected while converting a page stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertStats {
    /// Number of pages asked for, when known up front
    pub pages_requested: Option<u32>,

    /// Number of pages written
    pub pages_converted: u32,

    /// Number of word elements written
    pub word_count: u32,

    /// The page stream ended before every requested page was read
    pub truncated: bool,
}

impl ConvertStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create statistics for a run that expects `pages` pages.
    pub fn with_requested(pages: u32) -> Self {
        Self {
            pages_requested: Some(pages),
            ..Self::default()
        }
    }

    /// Record a converted page.
    pub fn add_page(&mut self, page: &Element) {
        self.pages_converted += 1;
        self.word_count += page.count_class(WORD_CLASS) as u32;
    }

    /// Mark the run as cut short.
    pub fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Number of requested pages that were never written.
    pub fn pages_missing(&self) -> u32 {
        self.pages_requested
            .map(|requested| requested.saturating_sub(self.pages_converted))
            .unwrap_or(0)
    }

    /// Check that every requested page was converted.
    pub fn is_complete(&self) -> bool {
        !self.truncated && self.pages_missing() == 0
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ConvertStats) {
        self.pages_requested = match (self.pages_requested, other.pages_requested) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        self.pages_converted += other.pages_converted;
        self.word_count += other.word_count;
        self.truncated |= other.truncated;
    }
}
